//! Blocking chart window.

use image::RgbImage;

/// Pack RGB pixels into `0RGB` words, row-major.
pub fn to_argb_buffer(img: &RgbImage) -> Vec<u32> {
    img.pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
        })
        .collect()
}

/// Show `img` in a window until it is closed or Escape is pressed.
#[cfg(feature = "display")]
pub fn show(img: &RgbImage, title: &str) -> anyhow::Result<()> {
    use minifb::{Key, Window, WindowOptions};

    let (w, h) = (img.width() as usize, img.height() as usize);
    let buffer = to_argb_buffer(img);

    let mut window = Window::new(title, w, h, WindowOptions::default())
        .map_err(|e| anyhow::anyhow!("Failed to open chart window: {e}"))?;
    window.set_target_fps(30);

    tracing::info!("Showing chart; close the window to continue");
    while window.is_open() && !window.is_key_down(Key::Escape) {
        window
            .update_with_buffer(&buffer, w, h)
            .map_err(|e| anyhow::anyhow!("Failed to draw chart window: {e}"))?;
    }
    Ok(())
}

#[cfg(not(feature = "display"))]
pub fn show(_img: &RgbImage, _title: &str) -> anyhow::Result<()> {
    tracing::warn!("Built without the `display` feature; skipping chart window");
    Ok(())
}
