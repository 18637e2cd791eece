use lamina::core::bxdf::{ BxDF, TransportMode };
use lamina::core::material_loader::load_materials;
use lamina::io::exr_utils;
use lamina::math::constants::{ Float, PI };
use lamina::math::frame::spherical_direction;
use std::env;

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        eprintln!("Usage: {} <materials.xml> <id> <theta_o> <output.exr> [--width N] [--height N]", args[0]);
        std::process::exit(1);
    }

    let materials_path = &args[1];
    let material_id = &args[2];
    let theta_o: Float = match args[3].parse::<Float>() {
        Ok(degrees) => degrees.to_radians(),
        Err(_) => {
            eprintln!("Invalid theta_o: {}", args[3]);
            std::process::exit(1);
        }
    };
    let output_path = &args[4];

    let mut width: usize = 512;
    let mut height: usize = 256;
    let mut i = 5;
    while i < args.len() {
        match args[i].as_str() {
            "--width" => {
                i += 1;
                width = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(width);
            }
            "--height" => {
                i += 1;
                height = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(height);
            }
            _ => {}
        }
        i += 1;
    }
    if width == 0 || height == 0 {
        eprintln!("Image dimensions must be positive, got {}x{}.", width, height);
        std::process::exit(1);
    }

    let materials = load_materials(materials_path).unwrap_or_else(|e| {
        eprintln!("Failed to load materials: {}", e);
        std::process::exit(1);
    });
    let desc = match materials.iter().find(|m| m.id() == material_id.as_str()) {
        Some(desc) => desc,
        None => {
            eprintln!("Material '{}' not found in {}.", material_id, materials_path);
            std::process::exit(2);
        }
    };
    let bxdf = desc.build().unwrap_or_else(|e| {
        eprintln!("Failed to build material '{}': {}", material_id, e);
        std::process::exit(1);
    });

    let wo = spherical_direction(theta_o.sin(), theta_o.cos(), 0.0);
    let mut image = Vec::with_capacity(width * height);
    for y in 0..height {
        let theta = (y as Float + 0.5) / height as Float * PI;
        for x in 0..width {
            let phi = (x as Float + 0.5) / width as Float * 2.0 * PI;
            let wi = spherical_direction(theta.sin(), theta.cos(), phi);
            let value = bxdf.f(wo, wi, TransportMode::Radiance) * wi.z.abs();
            image.push((value[0], value[1], value[2]));
        }
    }

    if let Err(e) = exr_utils::write_exr_to_file(&image, width, height, output_path) {
        eprintln!("Failed to write {}: {}", output_path, e);
        std::process::exit(1);
    }
}
