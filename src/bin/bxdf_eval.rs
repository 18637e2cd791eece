use lamina::core::bxdf::{ BxDF, BxDFReflTransFlags, TransportMode };
use lamina::core::computation_node::ComputationNode;
use lamina::core::material_loader::load_materials;
use lamina::math::constants::Float;
use lamina::math::frame::spherical_direction;
use std::env;

fn parse_angle(args: &[String], index: usize) -> Float {
    match args.get(index).and_then(|v| v.parse::<Float>().ok()) {
        Some(degrees) => degrees.to_radians(),
        None => {
            eprintln!("Invalid angle argument at position {}.", index);
            std::process::exit(1);
        }
    }
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 7 {
        eprintln!("Usage: {} <materials.xml> <id> <theta_o> <phi_o> <theta_i> <phi_i> [--mode radiance|importance]", args[0]);
        std::process::exit(1);
    }

    let materials_path = &args[1];
    let material_id = &args[2];
    let theta_o = parse_angle(&args, 3);
    let phi_o = parse_angle(&args, 4);
    let theta_i = parse_angle(&args, 5);
    let phi_i = parse_angle(&args, 6);

    let mut mode = TransportMode::Radiance;
    let mut i = 7;
    while i < args.len() {
        match args[i].as_str() {
            "--mode" => {
                i += 1;
                mode = match args.get(i).map(|v| v.as_str()) {
                    Some("importance") => TransportMode::Importance,
                    Some("radiance") => TransportMode::Radiance,
                    other => {
                        eprintln!("Unknown transport mode {:?}, expected radiance or importance.", other);
                        std::process::exit(1);
                    }
                };
            }
            _ => {}
        }
        i += 1;
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

    let wo = spherical_direction(theta_o.sin(), theta_o.cos(), phi_o);
    let wi = spherical_direction(theta_i.sin(), theta_i.cos(), phi_i);
    let f = bxdf.f(wo, wi, mode);
    let pdf = bxdf.pdf(wo, wi, mode, BxDFReflTransFlags::ALL);

    println!("{}", bxdf.to_string());
    println!("flags: {:?}", bxdf.flags());
    println!("mode: {}", mode);
    println!("wo: ({:.6}, {:.6}, {:.6})", wo.x, wo.y, wo.z);
    println!("wi: ({:.6}, {:.6}, {:.6})", wi.x, wi.y, wi.z);
    println!("f: {:?}", f.values());
    println!("pdf: {:.6}", pdf);
}
