//! Extract a palette from a synthetic image, inline and through the worker.
//!
//! Run with `RUST_LOG=info` to see the extractor's progress.

use auto_palette::{Dbscan, ExtractorOptions, ImageData, Kmeans, Palette, PaletteWorker, Theme};

/// Horizontal bands of sunset colors over a dark strip.
fn sunset(width: u32, height: u32) -> auto_palette::Result<ImageData> {
    const BANDS: [[u8; 4]; 4] = [
        [255, 94, 77, 255],
        [255, 154, 0, 255],
        [255, 206, 84, 255],
        [32, 24, 64, 255],
    ];
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        let band = BANDS[(y * BANDS.len() as u32 / height) as usize];
        for _ in 0..width {
            data.extend_from_slice(&band);
        }
    }
    ImageData::new(width, height, data)
}

fn print(title: &str, palette: &Palette) -> auto_palette::Result<()> {
    println!("=== {} ({} swatches) ===", title, palette.len());
    for swatch in palette.find_swatches(5)? {
        println!(
            "  {}  population {:4}  at {:?}",
            swatch.color().to_hex_string(),
            swatch.population(),
            swatch.position()
        );
    }
    for theme in [Theme::Vivid, Theme::Dark] {
        let picked: Vec<String> = palette
            .find_swatches_with_theme(2, theme)?
            .iter()
            .map(|s| s.color().to_hex_string())
            .collect();
        println!("  {:?}: {:?}", theme, picked);
    }
    println!();
    Ok(())
}

fn main() -> auto_palette::Result<()> {
    env_logger::init();

    let image = sunset(32, 32)?.with_origin(640, 640)?;
    let options = ExtractorOptions::default().with_algorithm(Dbscan::new(4, 0.1));
    let palette = Palette::extract(&image, &options)?;
    print("DBSCAN", &palette)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| auto_palette::Error::Worker(e.to_string()))?;
    let palette = runtime.block_on(async {
        let worker = PaletteWorker::spawn();
        let options = ExtractorOptions::default().with_algorithm(Kmeans::new(4).with_seed(1));
        worker.extract(sunset(32, 32)?, options).await
    })?;
    print("K-means via worker", &palette)
}
