//! K-means, DBSCAN, and HDBSCAN on a simple 2D dataset.
//!
//! Run with `RUST_LOG=debug` to see what each algorithm logs.

use auto_palette::cluster::{Clustering, Dbscan, Hdbscan, Kmeans, Labels, NOISE};
use auto_palette::math::Euclidean;

fn report(title: &str, data: &[[f64; 2]], labels: &Labels) {
    println!("=== {} ===", title);
    for (i, label) in labels.iter().enumerate() {
        let tag = if label == NOISE {
            "NOISE".to_string()
        } else {
            format!("cluster {}", label)
        };
        println!("  point {:2} ({:5.1}, {:5.1}) => {}", i, data[i][0], data[i][1], tag);
    }
    println!();
}

fn main() -> auto_palette::Result<()> {
    env_logger::init();

    // Three well-separated groups and one straggler.
    let data: Vec<[f64; 2]> = vec![
        [0.0, 0.0],
        [0.1, 0.2],
        [0.2, 0.1],
        [-0.1, 0.1],
        [5.0, 5.0],
        [5.1, 4.9],
        [4.9, 5.1],
        [5.2, 5.2],
        [10.0, 0.0],
        [10.1, 0.1],
        [9.9, -0.1],
        [10.2, 0.2],
        [5.0, -6.0],
    ];

    let fit = Kmeans::new(3).with_seed(42).fit(&data, &Euclidean)?;
    report(
        &format!("K-means (k=3, {} iterations)", fit.iterations),
        &data,
        &fit.labels,
    );

    let labels = Dbscan::new(2, 1.0).fit_predict(&data, &Euclidean)?;
    report("DBSCAN (min_points=2, threshold=1.0)", &data, &labels);

    let labels = Hdbscan::new(2, 3).fit_predict(&data, &Euclidean)?;
    report("HDBSCAN (min_points=2, min_cluster_size=3)", &data, &labels);

    Ok(())
}
