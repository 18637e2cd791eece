// Copyright @yucwang 2026

use crate::core::bxdf::{ BSDFSample, BxDF, BxDFFlags, BxDFReflTransFlags, TransportMode };
use crate::core::computation_node::ComputationNode;
use crate::core::hash::{ hash_direction, hash_sample, hash_seeded_direction };
use crate::core::options;
use crate::core::rng::SequenceRng;
use crate::math::constants::{ Float, INV_4PI, Vector2f, Vector3f };
use crate::math::frame::{ abs_cos_theta, same_hemisphere };
use crate::math::spectrum::SampledSpectrum;
use crate::math::warp::{ lerp, power_heuristic, sample_exponential };
use crate::media::phase_function::PhaseFunction;
use crate::media::slab::{ transmittance, LayerSlab };

/// Random-walk settings; fixed for the lifetime of a layered material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayeredBxDFConfig {
    pub max_depth: u8,
    pub n_samples: u8,
    pub two_sided: bool,
}

impl Default for LayeredBxDFConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            n_samples: 1,
            two_sided: true,
        }
    }
}

/// Borrowed reference to whichever interface the walk is currently at.
pub enum TopOrBottomBxDF<'a, T, B> {
    Top(&'a T),
    Bottom(&'a B),
}

impl<'a, T, B> Clone for TopOrBottomBxDF<'a, T, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T, B> Copy for TopOrBottomBxDF<'a, T, B> {}

impl<'a, T: BxDF, B: BxDF> TopOrBottomBxDF<'a, T, B> {
    pub fn f(&self, wo: Vector3f, wi: Vector3f, mode: TransportMode) -> SampledSpectrum {
        match self {
            TopOrBottomBxDF::Top(top) => top.f(wo, wi, mode),
            TopOrBottomBxDF::Bottom(bottom) => bottom.f(wo, wi, mode),
        }
    }

    pub fn sample_f(&self,
                    wo: Vector3f,
                    uc: Float,
                    u: Vector2f,
                    mode: TransportMode,
                    sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        match self {
            TopOrBottomBxDF::Top(top) => top.sample_f(wo, uc, u, mode, sample_flags),
            TopOrBottomBxDF::Bottom(bottom) => bottom.sample_f(wo, uc, u, mode, sample_flags),
        }
    }

    pub fn pdf(&self,
               wo: Vector3f,
               wi: Vector3f,
               mode: TransportMode,
               sample_flags: BxDFReflTransFlags) -> Float {
        match self {
            TopOrBottomBxDF::Top(top) => top.pdf(wo, wi, mode, sample_flags),
            TopOrBottomBxDF::Bottom(bottom) => bottom.pdf(wo, wi, mode, sample_flags),
        }
    }

    pub fn flags(&self) -> BxDFFlags {
        match self {
            TopOrBottomBxDF::Top(top) => top.flags(),
            TopOrBottomBxDF::Bottom(bottom) => bottom.flags(),
        }
    }

    pub fn is_non_specular(&self) -> bool {
        self.flags().is_non_specular()
    }
}

// A sample the walk can continue from.
fn usable(sample: Option<BSDFSample>) -> Option<BSDFSample> {
    sample.filter(|s| !s.f.is_black() && s.pdf > 0.0 && s.wi.z != 0.0)
}

/// Two scattering interfaces separated by a homogeneous slab, evaluated by
/// simulating transport between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayeredBxDF<T, B> {
    top: T,
    bottom: B,
    slab: LayerSlab,
    config: LayeredBxDFConfig,
}

impl<T: BxDF, B: BxDF> LayeredBxDF<T, B> {
    pub fn new(top: T, bottom: B, slab: LayerSlab, config: LayeredBxDFConfig) -> Self {
        debug_assert!(config.n_samples > 0, "layered material needs at least one walk");
        Self {
            top,
            bottom,
            slab,
            config,
        }
    }

    pub fn top(&self) -> &T {
        &self.top
    }

    pub fn bottom(&self) -> &B {
        &self.bottom
    }

    pub fn slab(&self) -> &LayerSlab {
        &self.slab
    }

    pub fn config(&self) -> &LayeredBxDFConfig {
        &self.config
    }

    fn allows(sample_flags: BxDFReflTransFlags, reflection: bool) -> bool {
        if reflection {
            sample_flags.contains(BxDFReflTransFlags::REFLECTION)
        } else {
            sample_flags.contains(BxDFReflTransFlags::TRANSMISSION)
        }
    }

    fn walk_sample(&self,
                   wo: Vector3f,
                   uc: Float,
                   u: Vector2f,
                   mode: TransportMode) -> Option<BSDFSample> {
        let mut wo = wo;
        let mut flip_wi = false;
        if self.config.two_sided && wo.z < 0.0 {
            wo = -wo;
            flip_wi = true;
        }

        // Entrance interface.
        let entered_top = wo.z > 0.0;
        let entrance = if entered_top {
            self.top.sample_f(wo, uc, u, mode, BxDFReflTransFlags::ALL)
        } else {
            self.bottom.sample_f(wo, uc, u, mode, BxDFReflTransFlags::ALL)
        };
        let mut bs = usable(entrance)?;
        if bs.is_reflection() {
            if flip_wi {
                bs.wi = -bs.wi;
            }
            return Some(bs);
        }
        let mut w = bs.wi;

        let mut rng = SequenceRng::new(hash_seeded_direction(options::seed(), &wo), hash_sample(uc, &u));
        let mut r = || rng.uniform();

        let thickness = self.slab.thickness();
        let albedo = self.slab.albedo();
        let scattering = self.slab.has_scattering();
        let phase = self.slab.phase_function();

        let mut f = bs.f * abs_cos_theta(&bs.wi);
        let mut pdf = bs.pdf;
        let mut z = if entered_top { thickness } else { 0.0 };

        for depth in 0..self.config.max_depth {
            let rr_beta = f.max_component_value() / pdf;
            if depth > 3 && rr_beta < 0.25 {
                let q = (1.0 - rr_beta).max(0.0);
                if r() < q {
                    return None;
                }
                pdf *= 1.0 - q;
            }
            if w.z == 0.0 {
                return None;
            }

            if scattering {
                let dz = sample_exponential(r(), 1.0 / abs_cos_theta(&w));
                let zp = if w.z > 0.0 { z + dz } else { z - dz };
                if zp == z {
                    return None;
                }
                if 0.0 < zp && zp < thickness {
                    let ps = phase.sample_p(-w, Vector2f::new(r(), r()))
                        .filter(|ps| ps.pdf > 0.0 && ps.wi.z != 0.0)?;
                    f *= albedo * ps.p;
                    pdf *= ps.pdf;
                    w = ps.wi;
                    z = zp;
                    continue;
                }
                z = zp.clamp(0.0, thickness);
            } else {
                z = if z == thickness { 0.0 } else { thickness };
                f *= transmittance(thickness, &w);
            }

            let interface: TopOrBottomBxDF<T, B> = if z == 0.0 {
                TopOrBottomBxDF::Bottom(&self.bottom)
            } else {
                TopOrBottomBxDF::Top(&self.top)
            };

            let uc = r();
            let u = Vector2f::new(r(), r());
            let bs = usable(interface.sample_f(-w, uc, u, mode, BxDFReflTransFlags::ALL))?;
            f *= bs.f;
            pdf *= bs.pdf;
            w = bs.wi;

            if bs.is_transmission() {
                let flags = if same_hemisphere(&wo, &w) {
                    BxDFFlags::GLOSSY_REFLECTION
                } else {
                    BxDFFlags::GLOSSY_TRANSMISSION
                };
                if flip_wi {
                    w = -w;
                }
                if pdf <= 0.0 || !pdf.is_finite() {
                    return None;
                }
                return Some(BSDFSample::new(f, w, pdf, flags).with_proportional_pdf(true));
            }

            f *= abs_cos_theta(&bs.wi);
        }
        None
    }
}

impl<T: BxDF + ComputationNode, B: BxDF + ComputationNode> ComputationNode for LayeredBxDF<T, B> {
    fn to_string(&self) -> String {
        format!("LayeredBxDF: [ top: {}, bottom: {}, thickness: {}, albedo: {:?}, g: {}, config: {:?} ]",
                self.top.to_string(), self.bottom.to_string(), self.slab.thickness(),
                self.slab.albedo().values(), self.slab.g(), self.config)
    }
}

impl<T: BxDF, B: BxDF> BxDF for LayeredBxDF<T, B> {
    fn name(&self) -> &'static str {
        "LayeredBxDF"
    }

    fn flags(&self) -> BxDFFlags {
        let top_flags = self.top.flags();
        let bottom_flags = self.bottom.flags();
        debug_assert!(top_flags.is_transmissive() || bottom_flags.is_transmissive(),
                      "layered material with two opaque interfaces");

        let mut flags = BxDFFlags::REFLECTION;
        if top_flags.is_specular() {
            flags |= BxDFFlags::SPECULAR;
        }

        if top_flags.is_diffuse() || bottom_flags.is_diffuse() || self.slab.has_scattering() {
            flags |= BxDFFlags::DIFFUSE;
        } else if top_flags.is_glossy() || bottom_flags.is_glossy() {
            flags |= BxDFFlags::GLOSSY;
        }

        if top_flags.is_transmissive() && bottom_flags.is_transmissive() {
            flags |= BxDFFlags::TRANSMISSION;
        }
        flags
    }

    fn f(&self, wo: Vector3f, wi: Vector3f, mode: TransportMode) -> SampledSpectrum {
        let (mut wo, mut wi) = (wo, wi);
        if self.config.two_sided && wo.z < 0.0 {
            wo = -wo;
            wi = -wi;
        }

        let entered_top = wo.z > 0.0;
        let enter_interface: TopOrBottomBxDF<T, B> = if entered_top {
            TopOrBottomBxDF::Top(&self.top)
        } else {
            TopOrBottomBxDF::Bottom(&self.bottom)
        };

        let same = same_hemisphere(&wo, &wi);
        let thickness = self.slab.thickness();
        let (exit_interface, non_exit_interface, exit_z): (TopOrBottomBxDF<T, B>, TopOrBottomBxDF<T, B>, Float) =
            if same ^ entered_top {
                (TopOrBottomBxDF::Bottom(&self.bottom), TopOrBottomBxDF::Top(&self.top), 0.0)
            } else {
                (TopOrBottomBxDF::Top(&self.top), TopOrBottomBxDF::Bottom(&self.bottom), thickness)
            };
        let exit_specular = exit_interface.flags().is_specular();
        let non_exit_specular = non_exit_interface.flags().is_specular();

        let n_samples = self.config.n_samples as Float;
        let mut f = SampledSpectrum::zero();
        if same {
            f = enter_interface.f(wo, wi, mode) * n_samples;
        }

        let mut rng = SequenceRng::new(hash_seeded_direction(options::seed(), &wo), hash_direction(&wi));
        let mut r = || rng.uniform();

        let albedo = self.slab.albedo();
        let scattering = self.slab.has_scattering();
        let phase = self.slab.phase_function();

        for _ in 0..self.config.n_samples {
            // Transmission through the entrance interface.
            let uc = r();
            let Some(wos) = usable(enter_interface.sample_f(wo, uc, Vector2f::new(r(), r()), mode,
                                                            BxDFReflTransFlags::TRANSMISSION)) else {
                continue;
            };

            let mut beta = wos.f * abs_cos_theta(&wos.wi) / wos.pdf;
            let mut w = wos.wi;
            let mut z = if entered_top { thickness } else { 0.0 };

            // Exit direction for next event estimation, sampled from the adjoint side.
            let uc = r();
            let Some(wis) = usable(exit_interface.sample_f(wi, uc, Vector2f::new(r(), r()), !mode,
                                                           BxDFReflTransFlags::TRANSMISSION)) else {
                continue;
            };

            for depth in 0..self.config.max_depth {
                log::trace!("layered walk depth {}: beta {:?}, w {:?}, f {:?}",
                            depth, beta.values(), w, f.values());

                if depth > 3 && beta.max_component_value() < 0.25 {
                    let q = (1.0 - beta.max_component_value()).max(0.0);
                    if r() < q {
                        break;
                    }
                    beta /= 1.0 - q;
                }

                if !scattering {
                    z = if z == thickness { 0.0 } else { thickness };
                    beta *= transmittance(thickness, &w);
                } else {
                    let dz = sample_exponential(r(), 1.0 / w.z.abs());
                    let zp = if w.z > 0.0 { z + dz } else { z - dz };
                    if zp == z {
                        continue;
                    }
                    if 0.0 < zp && zp < thickness {
                        // Medium event: connect to the pre-sampled exit direction.
                        let mut wt = 1.0;
                        if !exit_specular {
                            wt = power_heuristic(1.0, wis.pdf, 1.0, phase.pdf(-w, -wis.wi));
                        }
                        f += beta * albedo * (phase.p(-w, -wis.wi) * wt * transmittance(zp - exit_z, &wis.wi))
                            * wis.f / wis.pdf;

                        let Some(ps) = phase.sample_p(-w, Vector2f::new(r(), r()))
                            .filter(|ps| ps.pdf > 0.0 && ps.wi.z != 0.0) else {
                            continue;
                        };
                        beta *= albedo * (ps.p / ps.pdf);
                        w = ps.wi;
                        z = zp;

                        if !exit_specular {
                            let f_exit = exit_interface.f(-w, wi, mode);
                            if !f_exit.is_black() {
                                let exit_pdf = exit_interface.pdf(-w, wi, mode, BxDFReflTransFlags::TRANSMISSION);
                                let weight = power_heuristic(1.0, ps.pdf, 1.0, exit_pdf);
                                f += beta * f_exit * (transmittance(zp - exit_z, &ps.wi) * weight);
                            }
                        }
                        continue;
                    }
                    z = zp.clamp(0.0, thickness);
                }

                if z == exit_z {
                    let uc = r();
                    let Some(bs) = usable(exit_interface.sample_f(-w, uc, Vector2f::new(r(), r()), mode,
                                                                  BxDFReflTransFlags::REFLECTION)) else {
                        break;
                    };
                    beta *= bs.f * (abs_cos_theta(&bs.wi) / bs.pdf);
                    w = bs.wi;
                } else {
                    if !non_exit_specular {
                        let mut wt = 1.0;
                        if !exit_specular {
                            wt = power_heuristic(1.0, wis.pdf, 1.0,
                                                 non_exit_interface.pdf(-w, -wis.wi, mode, BxDFReflTransFlags::ALL));
                        }
                        f += beta * non_exit_interface.f(-w, -wis.wi, mode)
                            * (abs_cos_theta(&wis.wi) * wt * transmittance(thickness, &wis.wi))
                            * wis.f / wis.pdf;
                    }

                    let uc = r();
                    let u = Vector2f::new(r(), r());
                    let Some(bs) = usable(non_exit_interface.sample_f(-w, uc, u, mode,
                                                                      BxDFReflTransFlags::REFLECTION)) else {
                        break;
                    };
                    beta *= bs.f * (abs_cos_theta(&bs.wi) / bs.pdf);
                    w = bs.wi;

                    if !exit_specular {
                        let f_exit = exit_interface.f(-w, wi, mode);
                        if !f_exit.is_black() {
                            let mut wt = 1.0;
                            if !non_exit_specular {
                                let exit_pdf = exit_interface.pdf(-w, wi, mode, BxDFReflTransFlags::TRANSMISSION);
                                wt = power_heuristic(1.0, bs.pdf, 1.0, exit_pdf);
                            }
                            f += beta * f_exit * (transmittance(thickness, &bs.wi) * wt);
                        }
                    }
                }
            }
        }

        f / n_samples
    }

    fn sample_f(&self,
                wo: Vector3f,
                uc: Float,
                u: Vector2f,
                mode: TransportMode,
                sample_flags: BxDFReflTransFlags) -> Option<BSDFSample> {
        // The walk decides the lobe; a disallowed outcome counts as no contribution.
        let sample = self.walk_sample(wo, uc, u, mode)?;
        if !Self::allows(sample_flags, same_hemisphere(&wo, &sample.wi)) {
            return None;
        }
        Some(sample)
    }

    fn pdf(&self,
           wo: Vector3f,
           wi: Vector3f,
           mode: TransportMode,
           sample_flags: BxDFReflTransFlags) -> Float {
        if !Self::allows(sample_flags, same_hemisphere(&wo, &wi)) {
            return 0.0;
        }

        let (mut wo, mut wi) = (wo, wi);
        if self.config.two_sided && wo.z < 0.0 {
            wo = -wo;
            wi = -wi;
        }

        let mut rng = SequenceRng::new(hash_seeded_direction(options::seed(), &wo), hash_direction(&wi));
        let mut r = || rng.uniform();

        let entered_top = wo.z > 0.0;
        let same = same_hemisphere(&wo, &wi);
        let n_samples = self.config.n_samples as Float;
        let mut pdf_sum = 0.0;
        if same {
            let reflection = BxDFReflTransFlags::REFLECTION;
            pdf_sum += n_samples * if entered_top {
                self.top.pdf(wo, wi, mode, reflection)
            } else {
                self.bottom.pdf(wo, wi, mode, reflection)
            };
        }

        for _ in 0..self.config.n_samples {
            if same {
                // Transmit, reflect, transmit.
                let (r_interface, t_interface): (TopOrBottomBxDF<T, B>, TopOrBottomBxDF<T, B>) = if entered_top {
                    (TopOrBottomBxDF::Bottom(&self.bottom), TopOrBottomBxDF::Top(&self.top))
                } else {
                    (TopOrBottomBxDF::Top(&self.top), TopOrBottomBxDF::Bottom(&self.bottom))
                };

                let transmission = BxDFReflTransFlags::TRANSMISSION;
                let wos = t_interface.sample_f(wo, r(), Vector2f::new(r(), r()), mode, transmission)
                    .filter(|s| !s.f.is_black() && s.pdf > 0.0);
                let wis = t_interface.sample_f(wi, r(), Vector2f::new(r(), r()), !mode, transmission)
                    .filter(|s| !s.f.is_black() && s.pdf > 0.0);

                if let (Some(wos), Some(wis)) = (wos, wis) {
                    if !t_interface.is_non_specular() {
                        pdf_sum += r_interface.pdf(-wos.wi, -wis.wi, mode, BxDFReflTransFlags::ALL);
                    } else {
                        let rs = r_interface.sample_f(-wos.wi, r(), Vector2f::new(r(), r()), mode, BxDFReflTransFlags::ALL)
                            .filter(|s| !s.f.is_black() && s.pdf > 0.0);
                        match rs {
                            None => {}
                            Some(rs) if !r_interface.is_non_specular() => {
                                pdf_sum += t_interface.pdf(-rs.wi, wi, mode, BxDFReflTransFlags::ALL);
                            }
                            Some(rs) => {
                                let t_pdf = t_interface.pdf(-rs.wi, wi, mode, BxDFReflTransFlags::ALL);
                                pdf_sum += power_heuristic(1.0, rs.pdf, 1.0, t_pdf) * t_pdf;

                                let r_pdf = r_interface.pdf(-wos.wi, -wis.wi, mode, BxDFReflTransFlags::ALL);
                                pdf_sum += power_heuristic(1.0, wis.pdf, 1.0, r_pdf) * r_pdf;
                            }
                        }
                    }
                }
            } else {
                // Transmit, transmit.
                let (to_interface, ti_interface): (TopOrBottomBxDF<T, B>, TopOrBottomBxDF<T, B>) = if entered_top {
                    (TopOrBottomBxDF::Top(&self.top), TopOrBottomBxDF::Bottom(&self.bottom))
                } else {
                    (TopOrBottomBxDF::Bottom(&self.bottom), TopOrBottomBxDF::Top(&self.top))
                };

                let uc = r();
                let u = Vector2f::new(r(), r());
                let Some(wos) = usable(to_interface.sample_f(wo, uc, u, mode, BxDFReflTransFlags::ALL))
                    .filter(|s| !s.is_reflection()) else {
                    continue;
                };

                let uc = r();
                let u = Vector2f::new(r(), r());
                let Some(wis) = usable(ti_interface.sample_f(wi, uc, u, !mode, BxDFReflTransFlags::ALL))
                    .filter(|s| !s.is_reflection()) else {
                    continue;
                };

                if to_interface.flags().is_specular() {
                    pdf_sum += ti_interface.pdf(-wos.wi, wi, mode, BxDFReflTransFlags::ALL);
                } else if ti_interface.flags().is_specular() {
                    pdf_sum += to_interface.pdf(wo, -wis.wi, mode, BxDFReflTransFlags::ALL);
                } else {
                    pdf_sum += (to_interface.pdf(wo, -wis.wi, mode, BxDFReflTransFlags::ALL)
                        + ti_interface.pdf(-wos.wi, wi, mode, BxDFReflTransFlags::ALL)) / 2.0;
                }
            }
        }

        // Blend with a uniform density so the estimate never vanishes.
        lerp(0.9, INV_4PI, pdf_sum / n_samples)
    }

    fn diffuse_reflectance(&self) -> SampledSpectrum {
        self.top.diffuse_reflectance() + self.bottom.diffuse_reflectance()
    }

    fn regularize(&mut self) {
        self.top.regularize();
        self.bottom.regularize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::conductor::ConductorBxDF;
    use crate::materials::dielectric::DielectricInterfaceBxDF;
    use crate::materials::diffuse::{ DiffuseBxDF, IdealDiffuseBxDF };
    use crate::materials::microfacet::TrowbridgeReitzDistribution;
    use crate::math::constants::INV_PI;
    use crate::math::frame::spherical_direction;
    use approx::assert_relative_eq;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn coated_diffuse(eta: Float, slab: LayerSlab, config: LayeredBxDFConfig)
        -> LayeredBxDF<DielectricInterfaceBxDF, IdealDiffuseBxDF> {
        LayeredBxDF::new(
            DielectricInterfaceBxDF::new(eta, TrowbridgeReitzDistribution::isotropic(0.0)),
            IdealDiffuseBxDF::new(SampledSpectrum::constant(0.5)),
            slab,
            config,
        )
    }

    fn scattering_coated_conductor() -> LayeredBxDF<DielectricInterfaceBxDF, ConductorBxDF> {
        LayeredBxDF::new(
            DielectricInterfaceBxDF::new(1.5, TrowbridgeReitzDistribution::isotropic(0.2)),
            ConductorBxDF::new(
                TrowbridgeReitzDistribution::isotropic(0.3),
                SampledSpectrum::new([0.2, 0.4, 1.1, 1.4]),
                SampledSpectrum::new([3.6, 2.9, 2.2, 1.8]),
            ),
            LayerSlab::new(0.1).with_albedo(SampledSpectrum::constant(0.6)).with_g(0.3),
            LayeredBxDFConfig::default(),
        )
    }

    fn random_upper(rng: &mut Pcg32) -> Vector3f {
        let cos = rng.gen_range(0.05..1.0 as Float);
        let sin = (1.0 - cos * cos).sqrt();
        spherical_direction(sin, cos, rng.gen_range(0.0..6.28 as Float))
    }

    #[test]
    fn test_flags() {
        let bxdf = coated_diffuse(1.5, LayerSlab::new(0.01), LayeredBxDFConfig::default());
        let flags = bxdf.flags();
        assert!(flags.is_reflective());
        assert!(flags.is_specular());
        assert!(flags.is_diffuse());
        assert!(!flags.is_transmissive());

        let conductor = scattering_coated_conductor();
        assert!(conductor.flags().is_diffuse());
        assert!(!conductor.flags().is_specular());
    }

    #[test]
    fn test_transmissive_bottom_adds_transmission_flag() {
        let bxdf = LayeredBxDF::new(
            DielectricInterfaceBxDF::new(1.3, TrowbridgeReitzDistribution::isotropic(0.3)),
            DiffuseBxDF::new(SampledSpectrum::constant(0.4), SampledSpectrum::constant(0.4), 0.0),
            LayerSlab::new(0.05),
            LayeredBxDFConfig::default(),
        );
        assert!(bxdf.flags().is_transmissive());
        assert!(bxdf.flags().is_diffuse());
    }

    #[test]
    fn test_vanishing_coat_approaches_bottom() {
        // Index 1 (nudged to 1.001), no thickness and no medium: the coat almost disappears.
        let bxdf = coated_diffuse(1.0, LayerSlab::new(Float::MIN_POSITIVE), LayeredBxDFConfig::default());
        let wo = spherical_direction(0.5, 0.866_025_4, 0.2);
        let wi = spherical_direction(0.6, 0.8, 2.2);
        let f = bxdf.f(wo, wi, TransportMode::Radiance);
        for i in 0..4 {
            assert_relative_eq!(f[i], 0.5 * INV_PI, max_relative = 0.01);
        }
    }

    #[test]
    fn test_thin_coat_bounded_below_by_single_bounce() {
        let eta = 1.5;
        let bxdf = coated_diffuse(eta, LayerSlab::new(Float::MIN_POSITIVE), LayeredBxDFConfig::default());
        let wo = spherical_direction(0.5, 0.866_025_4, 0.2);
        let wi = spherical_direction(0.6, 0.8, 2.2);
        let t_o = 1.0 - crate::materials::fresnel::fr_dielectric(wo.z, eta);
        let t_i = 1.0 - crate::materials::fresnel::fr_dielectric(wi.z, eta);
        let single = t_o * t_i * 0.5 * INV_PI / (eta * eta);
        let f = bxdf.f(wo, wi, TransportMode::Radiance);
        assert!(f[0] >= single * (1.0 - 1e-4), "{} < {}", f[0], single);
        assert!(f.is_finite());
    }

    #[test]
    fn test_coated_diffuse_directional_albedo() {
        let eta = 1.5;
        let rho = 0.5;
        let config = LayeredBxDFConfig { max_depth: 64, n_samples: 1, two_sided: true };
        let bxdf = coated_diffuse(eta, LayerSlab::new(Float::MIN_POSITIVE), config);

        // Hemispherical reflectance of the coat seen from inside, for cosine-distributed light.
        let steps = 20_000;
        let internal = (0..steps).map(|k| {
            let mu = (k as Float + 0.5) / steps as Float;
            crate::materials::fresnel::fr_dielectric(mu, 1.0 / eta) * 2.0 * mu
        }).sum::<Float>() / steps as Float;

        let mut rng = Pcg32::seed_from_u64(21);
        for &cos_o in [1.0 as Float, 0.5].iter() {
            let wo = spherical_direction((1.0 - cos_o * cos_o).sqrt(), cos_o, 0.7);
            let r_o = crate::materials::fresnel::fr_dielectric(cos_o, eta);
            let expected = r_o + (1.0 - r_o) * rho * (1.0 - internal) / (1.0 - rho * internal);

            let n = 40_000;
            let mut albedo = 0.0;
            for _ in 0..n {
                let u = Vector2f::new(rng.gen::<Float>(), rng.gen::<Float>());
                if let Some(bs) = bxdf.sample_f(wo, rng.gen::<Float>(), u, TransportMode::Radiance,
                                                BxDFReflTransFlags::ALL) {
                    assert!(bs.is_reflection());
                    albedo += bs.f[0] * abs_cos_theta(&bs.wi) / bs.pdf;
                }
            }
            albedo /= n as Float;
            assert!((albedo - expected).abs() < 0.015,
                    "cos_o = {}: albedo {} vs expected {}", cos_o, albedo, expected);
            // Everything beyond the first surface reflection is bounded by the diffuse albedo.
            assert!(albedo <= r_o + (1.0 - r_o) * rho + 0.015);
        }
    }

    #[test]
    fn test_sample_is_deterministic() {
        let bxdf = scattering_coated_conductor();
        let wo = spherical_direction(0.6, 0.8, 0.4);
        let u = Vector2f::new(0.31, 0.77);
        let a = bxdf.sample_f(wo, 0.42, u, TransportMode::Radiance, BxDFReflTransFlags::ALL);
        let b = bxdf.sample_f(wo, 0.42, u, TransportMode::Radiance, BxDFReflTransFlags::ALL);
        assert_eq!(a, b);
        let fa = bxdf.f(wo, spherical_direction(0.3, 0.953_939_2, 1.0), TransportMode::Radiance);
        let fb = bxdf.f(wo, spherical_direction(0.3, 0.953_939_2, 1.0), TransportMode::Radiance);
        assert_eq!(fa, fb);
    }

    #[test]
    fn test_sample_never_returns_zero_pdf() {
        let bxdf = scattering_coated_conductor();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut produced = 0;
        for _ in 0..512 {
            let wo = random_upper(&mut rng);
            let u = Vector2f::new(rng.gen::<Float>(), rng.gen::<Float>());
            if let Some(bs) = bxdf.sample_f(wo, rng.gen::<Float>(), u, TransportMode::Radiance, BxDFReflTransFlags::ALL) {
                assert!(bs.pdf > 0.0 && bs.pdf.is_finite());
                assert!(!bs.f.has_negative());
                produced += 1;
            }
        }
        assert!(produced > 0);
    }

    #[test]
    fn test_pdf_has_uniform_floor() {
        let bxdf = scattering_coated_conductor();
        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..128 {
            let wo = random_upper(&mut rng);
            let wi = random_upper(&mut rng);
            let pdf = bxdf.pdf(wo, wi, TransportMode::Radiance, BxDFReflTransFlags::ALL);
            assert!(pdf >= 0.1 * INV_4PI * (1.0 - 1e-5));
            assert!(pdf.is_finite());
        }
    }

    #[test]
    fn test_two_sided_symmetry() {
        let bxdf = scattering_coated_conductor();
        let wo = spherical_direction(0.6, 0.8, 0.4);
        let wi = spherical_direction(0.3, 0.953_939_2, 1.0);
        assert_eq!(bxdf.f(wo, wi, TransportMode::Radiance), bxdf.f(-wo, -wi, TransportMode::Radiance));
        assert_eq!(bxdf.pdf(wo, wi, TransportMode::Radiance, BxDFReflTransFlags::ALL),
                   bxdf.pdf(-wo, -wi, TransportMode::Radiance, BxDFReflTransFlags::ALL));
    }

    #[test]
    fn test_restricted_lobes() {
        let bxdf = coated_diffuse(1.5, LayerSlab::new(0.01), LayeredBxDFConfig::default());
        let wo = spherical_direction(0.6, 0.8, 0.4);
        let wi = spherical_direction(0.3, 0.953_939_2, 1.0);
        assert_eq!(bxdf.pdf(wo, wi, TransportMode::Radiance, BxDFReflTransFlags::TRANSMISSION), 0.0);
        for k in 0..16 {
            let uc = (k as Float + 0.5) / 16.0;
            assert!(bxdf.sample_f(wo, uc, Vector2f::new(0.4, 0.6), TransportMode::Radiance,
                                  BxDFReflTransFlags::TRANSMISSION).is_none());
        }
    }

    #[test]
    fn test_regularize_reaches_both_interfaces() {
        let mut bxdf = LayeredBxDF::new(
            DielectricInterfaceBxDF::new(1.5, TrowbridgeReitzDistribution::isotropic(0.0)),
            ConductorBxDF::new(TrowbridgeReitzDistribution::isotropic(0.0), SampledSpectrum::one(), SampledSpectrum::one()),
            LayerSlab::new(0.01),
            LayeredBxDFConfig::default(),
        );
        assert!(bxdf.flags().is_specular());
        bxdf.regularize();
        assert!(bxdf.top().flags().is_glossy());
        assert!(bxdf.bottom().flags().is_glossy());
        assert!(!bxdf.flags().is_specular());
    }
}
