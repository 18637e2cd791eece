/* Copyright 2020 @TwoCookingMice */

use crate::math::constants::Float;

use exr::error::{ Error, Result };
use exr::prelude::*;

// Write EXR Image to file
pub fn write_exr_to_file(image: &[(Float, Float, Float)],
                         width: usize,
                         height: usize,
                         file_path: &str) -> Result<()> {
    log::info!("Starting writing openexr images: {}.", file_path);
    if image.len() != width * height {
        return Err(Error::Invalid("pixel count does not match image dimensions".into()));
    }

    write_rgb_file(file_path, width, height, |x, y| {
        (
            image[y*width+x].0,
            image[y*width+x].1,
            image[y*width+x].2
        )
    })?;
    log::info!("EXR written to: {}.", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_small_image() {
        let path = std::env::temp_dir().join("lamina_exr_utils_test.exr");
        let path_str = path.to_string_lossy().to_string();
        let image = vec![(0.25, 0.5, 1.0); 4 * 3];
        write_exr_to_file(&image, 4, 3, &path_str).unwrap();
        let size = std::fs::metadata(&path).unwrap().len();
        assert!(size > 0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_rejects_mismatched_dimensions() {
        let path = std::env::temp_dir().join("lamina_exr_utils_bad.exr");
        let image = vec![(0.0, 0.0, 0.0); 5];
        assert!(write_exr_to_file(&image, 4, 3, &path.to_string_lossy()).is_err());
    }
}
