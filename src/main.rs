// Copyright 2020 TwoCookingMice

use lamina::core::bxdf::{ BxDF, BxDFReflTransFlags, TransportMode };
use lamina::core::computation_node::ComputationNode;
use lamina::core::material_loader::load_materials;
use lamina::core::options;
use lamina::materials::handle::BxDFHandle;
use lamina::math::constants::{ Float, Vector2f };
use lamina::math::frame::spherical_direction;
use lamina::math::spectrum::SampledSpectrum;

use indicatif::{ ProgressBar, ProgressStyle };
use rand::{ Rng, SeedableRng };
use rand_pcg::Pcg32;

use std::env;

const THETA_O_DEGREES: [Float; 4] = [0.0, 30.0, 60.0, 80.0];

struct AlbedoEstimate {
    reflection: SampledSpectrum,
    transmission: SampledSpectrum,
    absent: usize,
}

fn estimate_albedo(bxdf: &BxDFHandle, theta_o: Float, samples: usize, rng: &mut Pcg32) -> AlbedoEstimate {
    let theta = theta_o.to_radians();
    let wo = spherical_direction(theta.sin(), theta.cos(), 0.0);

    let mut estimate = AlbedoEstimate {
        reflection: SampledSpectrum::zero(),
        transmission: SampledSpectrum::zero(),
        absent: 0,
    };
    for _ in 0..samples {
        let uc: Float = rng.gen();
        let u = Vector2f::new(rng.gen(), rng.gen());
        let bs = match bxdf.sample_f(wo, uc, u, TransportMode::Radiance, BxDFReflTransFlags::ALL) {
            Some(bs) if bs.pdf > 0.0 => bs,
            _ => {
                estimate.absent += 1;
                continue;
            }
        };
        let weight = bs.f * (bs.wi.z.abs() / bs.pdf);
        if bs.is_transmission() {
            estimate.transmission += weight;
        } else {
            estimate.reflection += weight;
        }
    }
    let inv = 1.0 / samples.max(1) as Float;
    estimate.reflection *= inv;
    estimate.transmission *= inv;
    estimate
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <materials.xml> [--seed N] [--samples N] [--regularize]", args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let mut seed: u64 = 0;
    let mut samples: usize = 4096;
    let mut regularize = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|v| v.parse::<u64>().ok()).unwrap_or(seed);
            }
            "--samples" => {
                i += 1;
                samples = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(samples);
            }
            "--regularize" => {
                regularize = true;
            }
            other => {
                eprintln!("Ignoring unknown argument '{}'.", other);
            }
        }
        i += 1;
    }
    options::set_seed(seed);

    let materials = match load_materials(input_path) {
        Ok(materials) => materials,
        Err(e) => {
            eprintln!("Failed to load materials: {}", e);
            std::process::exit(1);
        }
    };

    let mut handles = Vec::with_capacity(materials.len());
    for desc in &materials {
        match desc.build() {
            Ok(mut handle) => {
                if regularize {
                    handle.regularize();
                }
                handles.push((desc.id().to_string(), handle));
            }
            Err(e) => {
                eprintln!("Failed to build material '{}': {}", desc.id(), e);
                std::process::exit(1);
            }
        }
    }

    let progress = ProgressBar::new((handles.len() * THETA_O_DEGREES.len()) as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} estimates")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut report = Vec::new();
    for (id, handle) in &handles {
        report.push(format!("{} ({})", id, handle.to_string()));
        for &theta_o in THETA_O_DEGREES.iter() {
            let estimate = estimate_albedo(handle, theta_o, samples, &mut rng);
            report.push(format!(
                "  theta_o = {:>4.1}  R = {:.4}  T = {:.4}  total = {:.4}  absent = {:.2}%",
                theta_o,
                estimate.reflection.average(),
                estimate.transmission.average(),
                (estimate.reflection + estimate.transmission).average(),
                100.0 * estimate.absent as Float / samples.max(1) as Float,
            ));
            progress.inc(1);
        }
    }
    progress.finish();

    for line in report {
        println!("{}", line);
    }
}
