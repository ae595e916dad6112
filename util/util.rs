#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use kmeans_compress::PixelBuffer;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

/// A smooth gradient with some noise, so that clustering has real structure to find.
pub fn synthetic_image(width: u32, height: u32, channels: u8, seed: u64) -> PixelBuffer {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    let mut data = Vec::with_capacity(width as usize * height as usize * usize::from(channels));

    for y in 0..height {
        for x in 0..width {
            let gx = (x * 255 / width.max(1)) as i32;
            let gy = (y * 255 / height.max(1)) as i32;
            for c in 0..channels {
                let base = match c {
                    0 => gx,
                    1 => gy,
                    2 => 255 - (gx + gy) / 2,
                    _ => 255,
                };
                let noise = rng.gen_range(-12..=12);
                data.push((base + noise).clamp(0, 255) as u8);
            }
        }
    }

    PixelBuffer::new(data, width, height, channels).expect("valid synthetic image")
}

pub fn synthetic_images() -> Vec<(String, PixelBuffer)> {
    [(64, 64), (256, 256), (640, 480)]
        .into_iter()
        .enumerate()
        .map(|(seed, (width, height))| {
            (
                format!("synthetic_{width}x{height}"),
                synthetic_image(width, height, 3, seed as u64),
            )
        })
        .collect()
}

pub fn load_images(images: &[PathBuf]) -> Vec<(String, PixelBuffer)> {
    images
        .iter()
        .map(|path| {
            PixelBuffer::open(path).map(|image| {
                (
                    path.file_name().unwrap().to_owned().into_string().unwrap(),
                    image,
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .expect("loaded each image")
        .into_iter()
        // the benchmarks cluster rgb colors
        .filter(|(_, image)| image.channels() == 3)
        .collect()
}

pub fn load_image_dir(dir: impl AsRef<Path>) -> Vec<(String, PixelBuffer)> {
    let mut paths = std::fs::read_dir(dir)
        .expect("read img directory")
        .collect::<Result<Vec<_>, _>>()
        .expect("read each file")
        .iter()
        .map(std::fs::DirEntry::path)
        .collect::<Vec<_>>();

    paths.sort();

    load_images(&paths)
}

/// Set `BENCH_IMAGE_DIR` to benchmark on a directory of real images instead of synthetic ones.
pub const IMAGE_DIR_VAR: &str = "BENCH_IMAGE_DIR";

static BENCH_IMAGES: OnceLock<Vec<(String, PixelBuffer)>> = OnceLock::new();

pub fn bench_images() -> &'static [(String, PixelBuffer)] {
    BENCH_IMAGES.get_or_init(|| match std::env::var_os(IMAGE_DIR_VAR) {
        Some(dir) => load_image_dir(dir),
        None => synthetic_images(),
    })
}
