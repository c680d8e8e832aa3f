//! The film rendering pipeline.
//!
//! Stages, in order:
//!
//! 1. standardize the frame size (optional)
//! 2. decode sRGB to linear light
//! 3. expose each emulsion layer: spectral response (curves or layer
//!    absorption), sensitivity and calibration gain
//! 4. optics: bloom, then halation
//! 5. layer composite `d · bloomed + l · lux^x`
//! 6. grain
//! 7. physical mode only: reciprocity and the H&D curve, read back as a
//!    positive
//! 8. tone mapping to display values
//! 9. composition: monochrome replicated to RGB
//!
//! Strategies are chosen once in [`FilmPipeline::new`]; rendering never
//! re-inspects the profile's mode flags.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, trace};

use film_core::{standardize, ChannelOrder, Image, Plane};
use film_emulsion::{
    apply_hd_curve, grain_model, negative_to_positive, scene_sensitivity, GrainModel,
    GrainStrategy, HdCurveParams, ToneMapper,
};
use film_ops::{
    ArtisticBloom, BloomModel, ConvolutionEngine, Halation, NoBloom, PhysicalBloom,
    WavelengthBloom,
};
use film_profile::{get_film_profile, EmulsionLayer, FilmProfile, PhysicsMode};
use film_spectral::{sensitivity_curves, srgb, SpectralResponse};

use crate::calibrate::{solve_gains, CALIBRATION_GREY};
use crate::{Diagnostics, PipelineResult, RenderOptions, Rendered, RenderedBytes};

/// A film profile bound to its stage implementations.
#[derive(Debug)]
pub struct FilmPipeline {
    profile: FilmProfile,
    options: RenderOptions,
    mode: PhysicsMode,
    engine: ConvolutionEngine,
    spectral: Option<SpectralResponse>,
    bloom: Box<dyn BloomModel>,
    halation: Option<Halation>,
    grain: Option<Box<dyn GrainModel>>,
    hd_curve: Option<HdCurveParams>,
    reciprocity: f32,
    tone: ToneMapper,
    gains: Vec<f32>,
}

fn select_bloom(
    profile: &FilmProfile,
    mode: PhysicsMode,
) -> PipelineResult<Box<dyn BloomModel>> {
    let bloom = profile.bloom();
    let wavelength = profile.wavelength_bloom();
    Ok(match mode {
        PhysicsMode::Physical if wavelength.enabled => {
            Box::new(WavelengthBloom::new(wavelength, profile.iso())?)
        }
        PhysicsMode::Physical if bloom.enabled => Box::new(PhysicalBloom::new(bloom)?),
        PhysicsMode::Artistic if bloom.enabled => Box::new(ArtisticBloom::new(bloom)),
        _ => Box::new(NoBloom),
    })
}

#[inline]
fn composite(layer: &EmulsionLayer, lux: f32, bloomed: f32) -> f32 {
    let direct = lux.max(0.0).powf(layer.response_exponent);
    (layer.diffuse_weight * bloomed.max(0.0) + layer.direct_weight * direct).max(0.0)
}

impl FilmPipeline {
    /// Builds the stage set for `profile` and, unless disabled, calibrates
    /// exposure.
    ///
    /// # Errors
    ///
    /// - [`film_spectral::SpectralError::SensitivityNotFound`] when the
    ///   profile names a curve set that does not exist
    /// - parameter errors from the optics, grain and tone stages
    pub fn new(profile: FilmProfile, options: RenderOptions) -> PipelineResult<Self> {
        let mode = options.physics_mode.unwrap_or(profile.physics_mode());

        let spectral = profile
            .sensitivity_curves()
            .map(|name| sensitivity_curves(name).map(SpectralResponse::new))
            .transpose()?;

        let bloom = select_bloom(&profile, mode)?;
        let halation = if profile.halation().enabled {
            Some(Halation::new(profile.halation())?)
        } else {
            None
        };

        let grain = if profile.grain().enabled {
            let mut params = profile.grain().clone();
            if let Some(forced) = options.physics_mode {
                params.strategy = match forced {
                    PhysicsMode::Physical => GrainStrategy::Poisson,
                    PhysicsMode::Artistic => GrainStrategy::Artistic,
                };
            }
            Some(grain_model(&params)?)
        } else {
            None
        };

        let (hd_curve, reciprocity) = match mode {
            PhysicsMode::Physical => (
                profile.hd_curve().enabled.then(|| profile.hd_curve().clone()),
                profile.reciprocity().exposure_factor(),
            ),
            PhysicsMode::Artistic => (None, 1.0),
        };

        let mut tone_params = profile.tone_mapping().clone();
        if let Some(style) = options.tone_style {
            tone_params.style = style;
        }
        let tone = ToneMapper::new(&tone_params)?;

        debug!(
            film = profile.name(),
            %mode,
            bloom = bloom.name(),
            halation = halation.is_some(),
            grain = grain.as_ref().map(|g| g.name()),
            spectral = spectral.as_ref().map(SpectralResponse::film),
            tone = ?tone_params.style,
            "pipeline stages selected"
        );

        let layers = profile.layers().len();
        let mut pipeline = Self {
            profile,
            options,
            mode,
            engine: ConvolutionEngine::new(),
            spectral,
            bloom,
            halation,
            grain,
            hd_curve,
            reciprocity,
            tone,
            gains: vec![1.0; layers],
        };

        if pipeline.options.calibrate {
            let grey = srgb::eotf(CALIBRATION_GREY);
            let gains = solve_gains(layers, |g| pipeline.uniform_output([grey; 3], g));
            debug!(film = pipeline.profile.name(), ?gains, "exposure calibrated");
            pipeline.gains = gains;
        }
        Ok(pipeline)
    }

    /// Resolves `name` in the built-in registry and builds its pipeline.
    pub fn for_film(name: &str, options: RenderOptions) -> PipelineResult<Self> {
        Self::new(get_film_profile(name)?.clone(), options)
    }

    /// The profile being rendered.
    pub fn profile(&self) -> &FilmProfile {
        &self.profile
    }

    /// Options in effect.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Physics mode after overrides.
    pub fn physics_mode(&self) -> PhysicsMode {
        self.mode
    }

    /// Per-layer exposure gains (all 1 without calibration).
    pub fn exposure_gains(&self) -> &[f32] {
        &self.gains
    }

    /// Convolution engine, with its kernel cache.
    pub fn engine(&self) -> &ConvolutionEngine {
        &self.engine
    }

    fn expose_pixel(&self, rgb: [f32; 3], gains: &[f32], out: &mut [f32]) {
        let rgb = match &self.spectral {
            Some(response) => response.apply(rgb),
            None => rgb.map(|v| if v > 0.0 { v } else { 0.0 }),
        };
        let k = self.profile.sensitivity_factor();
        for ((o, layer), g) in out.iter_mut().zip(self.profile.layers()).zip(gains) {
            let a = layer.absorption();
            *o = (a[0] * rgb[0] + a[1] * rgb[1] + a[2] * rgb[2]) * k * g;
        }
    }

    /// Per-layer exposure planes for a linear RGB frame.
    fn expose(&self, linear: &Image, gains: &[f32]) -> PipelineResult<Vec<Plane>> {
        let n = self.profile.layers().len();
        let (w, h) = linear.dimensions();
        let mut data = vec![0.0f32; w * h * n];
        data.par_chunks_mut(n)
            .zip(linear.data().par_chunks_exact(3))
            .for_each(|(out, px)| self.expose_pixel([px[0], px[1], px[2]], gains, out));
        Ok(Image::from_vec(w, h, n, data)?.planes())
    }

    /// Reciprocity, H&D and tone curve for one composited value.
    #[inline]
    fn develop_value(&self, exposure: f32) -> f32 {
        let e = exposure * self.reciprocity;
        let positive = match &self.hd_curve {
            Some(curve) => negative_to_positive(apply_hd_curve(e, curve), curve),
            None => e,
        };
        self.tone.map(positive)
    }

    /// Display values for a uniform linear colour, one per layer, without
    /// grain. Normalized PSFs and halation leave a uniform field unchanged,
    /// so only the bloom model's uniform response is needed.
    fn uniform_output(&self, rgb: [f32; 3], gains: &[f32]) -> Vec<f32> {
        let mut lux = vec![0.0; gains.len()];
        self.expose_pixel(rgb, gains, &mut lux);
        let mut bloomed = lux.clone();
        self.bloom.uniform_response(&mut bloomed);
        lux.iter()
            .zip(&bloomed)
            .zip(self.profile.layers())
            .map(|((&l, &b), layer)| self.develop_value(composite(layer, l, b)))
            .collect()
    }

    /// Runs stages 3 to 8 on a linear frame.
    fn develop(
        &self,
        linear: &Image,
        stages: &mut Vec<&'static str>,
    ) -> PipelineResult<(Vec<Plane>, Option<f64>)> {
        let lux = self.expose(linear, &self.gains)?;
        stages.push(if self.spectral.is_some() { "spectral" } else { "expose" });

        let mut bloomed = lux.clone();
        let energy_in: f64 = bloomed.iter().map(Plane::sum).sum();
        self.bloom.apply(&self.engine, &mut bloomed)?;
        stages.push("bloom");
        if let Some(halation) = &self.halation {
            halation.apply(&self.engine, &mut bloomed)?;
            stages.push("halation");
        }
        let energy_out: f64 = bloomed.iter().map(Plane::sum).sum();
        let energy_error = self.bloom.conserves_energy().then(|| {
            if energy_in > 1e-12 {
                ((energy_out - energy_in) / energy_in).abs()
            } else {
                0.0
            }
        });
        trace!(energy_in, energy_out, "optics");

        let mut planes = lux
            .iter()
            .zip(&bloomed)
            .zip(self.profile.layers())
            .map(|((l, b), layer)| l.zip_map(b, |l, b| composite(layer, l, b)))
            .collect::<Result<Vec<_>, _>>()?;
        stages.push("composite");

        if let (true, Some(model)) = (self.options.grain, &self.grain) {
            let sensitivity = if model.scene_sensitive() {
                scene_sensitivity(linear.luminance().mean() as f32)
            } else {
                1.0
            };
            let intensity = self.profile.grain().intensity;
            for (i, (plane, layer)) in planes.iter_mut().zip(self.profile.layers()).enumerate() {
                let k = layer.grain_intensity * intensity;
                if k == 0.0 {
                    continue;
                }
                let seed = self.options.seed.wrapping_add(i as u64);
                let noise = model.noise(&self.engine, plane, sensitivity, seed)?;
                *plane = plane.zip_map(&noise, |v, n| (v * (1.0 + k * n)).max(0.0))?;
            }
            stages.push("grain");
        }

        if self.mode == PhysicsMode::Physical {
            if self.reciprocity != 1.0 {
                stages.push("reciprocity");
            }
            if self.hd_curve.is_some() {
                stages.push("hd_curve");
            }
        }
        for plane in &mut planes {
            plane
                .data_mut()
                .par_iter_mut()
                .for_each(|v| *v = self.develop_value(*v));
        }
        stages.push("tone");

        Ok((planes, energy_error))
    }

    /// Renders a frame with values in [0, 1], sRGB encoded, RGB order.
    /// Monochrome input is treated as grey RGB.
    ///
    /// # Errors
    ///
    /// Shape errors from standardization and stage errors from the optics
    /// and grain models.
    pub fn render(&self, image: &Image) -> PipelineResult<Rendered> {
        let start = Instant::now();
        let mut stages = Vec::new();

        let mut frame = image.to_rgb();
        if let Some(min_edge) = self.options.min_edge {
            frame = standardize(&frame, min_edge)?;
            stages.push("standardize");
        }
        frame.map_in_place(srgb::eotf);
        stages.push("decode");

        let (planes, energy_error) = self.develop(&frame, &mut stages)?;

        let output = match planes.as_slice() {
            [mono] => Image::from_planes(&[mono.clone(), mono.clone(), mono.clone()])?,
            _ => Image::from_planes(&planes)?,
        };
        stages.push("compose");

        let diagnostics = Diagnostics {
            film: self.profile.name().to_string(),
            processing_time: start.elapsed(),
            energy_error,
            stages,
            output_size: output.dimensions(),
        };
        info!(
            film = %diagnostics.film,
            width = diagnostics.output_size.0,
            height = diagnostics.output_size.1,
            ms = diagnostics.processing_time.as_secs_f64() * 1000.0,
            energy_error = ?diagnostics.energy_error,
            "rendered frame"
        );
        Ok(Rendered {
            image: output,
            diagnostics,
        })
    }

    /// Renders interleaved 8-bit data in the options' channel order.
    ///
    /// `data` holds `width · height` pixels of 3 channels (or 1 for grey).
    /// The result uses the same channel order and always has 3 channels.
    pub fn render_u8(&self, data: &[u8], width: usize, height: usize) -> PipelineResult<RenderedBytes> {
        self.render_u8_ordered(data, width, height, self.options.channel_order)
    }

    /// [`FilmPipeline::render_u8`] with an explicit channel order.
    pub fn render_u8_ordered(
        &self,
        data: &[u8],
        width: usize,
        height: usize,
        order: ChannelOrder,
    ) -> PipelineResult<RenderedBytes> {
        let channels = if width > 0 && height > 0 && data.len() == width * height {
            1
        } else {
            3
        };
        let image = Image::from_u8(data, width, height, channels, order)?;
        let Rendered { image, diagnostics } = self.render(&image)?;
        Ok(RenderedBytes {
            data: image.to_u8(order),
            width: image.width(),
            height: image.height(),
            diagnostics,
        })
    }
}

/// Renders `image` with the built-in profile `name`.
///
/// # Errors
///
/// [`film_profile::ProfileError::UnknownFilm`] for an unregistered name,
/// otherwise as [`FilmPipeline::new`] and [`FilmPipeline::render`].
pub fn render_film(name: &str, image: &Image, options: RenderOptions) -> PipelineResult<Rendered> {
    FilmPipeline::for_film(name, options)?.render(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use film_profile::{create_film_profile_from_iso, FromIsoSpec};

    fn opts() -> RenderOptions {
        RenderOptions {
            grain: false,
            ..RenderOptions::native_size()
        }
    }

    fn profile(mode: PhysicsMode) -> FilmProfile {
        create_film_profile_from_iso(&FromIsoSpec {
            physics_mode: mode,
            ..FromIsoSpec::new("Test400", 400.0)
        })
        .unwrap()
    }

    #[test]
    fn test_calibration_hits_grey() {
        for mode in [PhysicsMode::Artistic, PhysicsMode::Physical] {
            let p = FilmPipeline::new(profile(mode), opts()).unwrap();
            let out = p.uniform_output([srgb::eotf(0.5); 3], p.exposure_gains());
            for v in out {
                assert!((v - 0.5).abs() < 1e-3, "{mode}: {v}");
            }
        }
    }

    #[test]
    fn test_uniform_render_matches_uniform_output() {
        let p = FilmPipeline::new(profile(PhysicsMode::Artistic), opts()).unwrap();
        let img = Image::filled(32, 32, &[0.5, 0.5, 0.5]).unwrap();
        let r = p.render(&img).unwrap();
        for px in r.image.data().chunks_exact(3) {
            for &v in px {
                assert!((v - 0.5).abs() < 2e-3, "{v}");
            }
        }
        assert!(r.diagnostics.energy_error.is_none());
    }

    #[test]
    fn test_stage_selection() {
        let p = FilmPipeline::new(profile(PhysicsMode::Physical), opts()).unwrap();
        assert_eq!(p.bloom.name(), "wavelength");
        assert!(p.hd_curve.is_some());
        assert_eq!(p.grain.as_ref().map(|g| g.name()), Some("poisson"));

        let forced = RenderOptions {
            physics_mode: Some(PhysicsMode::Artistic),
            ..opts()
        };
        let p = FilmPipeline::new(profile(PhysicsMode::Physical), forced).unwrap();
        assert_eq!(p.bloom.name(), "artistic");
        assert!(p.hd_curve.is_none());
        assert_eq!(p.grain.as_ref().map(|g| g.name()), Some("artistic"));
    }

    #[test]
    fn test_physical_reports_energy() {
        let p = FilmPipeline::new(profile(PhysicsMode::Physical), opts()).unwrap();
        let mut img = Image::filled(64, 64, &[0.1, 0.1, 0.1]).unwrap();
        for y in 28..36 {
            for x in 28..36 {
                let i = (y * 64 + x) * 3;
                img.data_mut()[i..i + 3].copy_from_slice(&[1.0, 1.0, 1.0]);
            }
        }
        let r = p.render(&img).unwrap();
        let err = r.diagnostics.energy_error.unwrap();
        assert!(err < 1e-4, "energy error {err}");
        assert!(r.diagnostics.stages.contains(&"hd_curve"));
        assert!(r.image.data().iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_missing_curves_fail_fast() {
        let mut spec = profile(PhysicsMode::Artistic).into_spec();
        spec.sensitivity_curves = Some("NoSuchFilm".into());
        let profile = FilmProfile::new(spec).unwrap();
        assert!(matches!(
            FilmPipeline::new(profile, opts()),
            Err(crate::PipelineError::Spectral(_))
        ));
    }
}
