
#[cfg(test)]
mod sampling {
    use vcm_rust::core::rng::RNG;
    use vcm_rust::core::medium::{HenyeyGreenstein, PhaseFunction};
    use vcm_rust::core::sampling::{Distribution1D, uniform_sample_sphere, concentric_sample_disk};
    use vcm_rust::core::sampler::{Sampler, Samplers};
    use vcm_rust::core::geometry::point::{Point2f, Point2i};
    use vcm_rust::core::geometry::vector::Vector3f;
    use vcm_rust::core::integrator::{
        LightSampleStrategy, compute_light_power_distribution, create_light_sample_distribution};
    use vcm_rust::core::pbrt::{Float, PI};
    use vcm_rust::samplers::random::RandomSampler;
    use vcm_rust::scenes::cornell_box;
    use approx::relative_eq;
    use std::path::Path;

    #[test]
    fn pcg_is_deterministic() {
        let mut a = RNG::new(0x1234);
        let mut b = RNG::new(0x1234);
        let xs: Vec<u32> = (0..32).map(|_| a.uniform_u32()).collect();
        let ys: Vec<u32> = (0..32).map(|_| b.uniform_u32()).collect();
        assert_eq!(xs, ys);

        let mut c = RNG::new(0x1235);
        let zs: Vec<u32> = (0..32).map(|_| c.uniform_u32()).collect();
        assert_ne!(xs, zs);
    }

    #[test]
    fn cloned_samplers_repeat_per_pixel_streams() {
        let prototype: Samplers = RandomSampler::new(5).into();
        let mut a = prototype.clone_with_seed(77);
        let mut b = prototype.clone_with_seed(77);

        // The values for a pixel do not depend on what ran before it
        a.start_pixel(2);
        for _ in 0..10 { a.get_1d(); }
        a.start_pixel(11);
        b.start_pixel(11);

        let ca = a.get_camera_sample(&Point2i::new(3, 4));
        let cb = b.get_camera_sample(&Point2i::new(3, 4));
        assert_eq!(ca.p_film, cb.p_film);
        assert_eq!(ca.p_lens, cb.p_lens);
        assert!(ca.p_film.x >= 3.0 && ca.p_film.x < 4.0);
        assert!(ca.p_film.y >= 4.0 && ca.p_film.y < 5.0);
    }

    #[test]
    fn discrete_distribution() {
        let d = Distribution1D::new(vec![1.0, 3.0, 0.0]);

        assert!(relative_eq!(d.discrete_pdf(0), 0.25));
        assert!(relative_eq!(d.discrete_pdf(1), 0.75));
        assert_eq!(d.discrete_pdf(2), 0.0);
        assert_eq!(d.sample_discrete(0.1).0, 0);
        assert_eq!(d.sample_discrete(0.5).0, 1);
        assert_eq!(d.sample_discrete(0.999).0, 1);

        // All-zero functions fall back to uniform
        let z = Distribution1D::new(vec![0.0; 4]);
        assert!(relative_eq!(z.discrete_pdf(3), 0.25));
    }

    #[test]
    fn concentric_disk_stays_in_unit_disk() {
        let mut rng = RNG::new(4);

        for _ in 0..1000 {
            let d = concentric_sample_disk(&Point2f::new(rng.uniform_float(), rng.uniform_float()));
            assert!(d.x * d.x + d.y * d.y <= 1.0 + 1.0e-5);
        }
        assert_eq!(concentric_sample_disk(&Point2f::new(0.5, 0.5)), Point2f::new(0.0, 0.0));
    }

    #[test]
    fn henyey_greenstein_sampling_matches_density() {
        let mut rng = RNG::default();
        let mut g = -0.75;

        while g <= 0.75 {
            let hg = HenyeyGreenstein::new(g);

            for _ in 0..100 {
                let wo = uniform_sample_sphere(&Point2f::new(rng.uniform_float(), rng.uniform_float()));
                let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
                let (p0, wi) = hg.sample_p(&wo, &u);
                // Phase function is normalized and the sampling method should be exact
                assert!(relative_eq!(p0, hg.p(&wo, &wi), epsilon = 1.0e-4, max_relative = 1.0e-3));
            }

            g += 0.25;
        }
    }

    #[test]
    fn henyey_greenstein_forward_scattering() {
        let mut rng = RNG::default();
        let hg = HenyeyGreenstein::new(0.95);
        let wo = Vector3f::new(-1.0, 0.0, 0.0);
        let mut nforward = 0;
        let mut nbackward = 0;

        for _ in 0..100 {
            let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
            let (_, wi) = hg.sample_p(&wo, &u);

            if wi.x > 0.0 { nforward += 1; } else { nbackward += 1; }
        }

        assert!(nforward > 10 * nbackward);
    }

    #[test]
    fn henyey_greenstein_normalized() {
        let mut rng = RNG::default();
        let hg = HenyeyGreenstein::new(0.5);
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        let nsamples = 100_000;
        let mut sum = 0.0;

        for _ in 0..nsamples {
            let wi = uniform_sample_sphere(&Point2f::new(rng.uniform_float(), rng.uniform_float()));
            sum += hg.p(&wo, &wi);
        }

        // Monte Carlo estimate of the integral over the sphere
        let integral = sum / nsamples as Float * 4.0 * PI;
        assert!((integral - 1.0).abs() < 0.02, "integral {}", integral);
    }

    #[test]
    fn light_power_distribution() {
        let (scene, _) = cornell_box(Point2i::new(4, 4), Path::new("unused.png")).unwrap();
        let d = compute_light_power_distribution(&scene).unwrap();

        // The ceiling emitter is two triangles of equal area
        assert_eq!(d.count(), 2);
        assert!(relative_eq!(d.discrete_pdf(0), 0.5, max_relative = 1.0e-4));

        let u = create_light_sample_distribution(LightSampleStrategy::Uniform, &scene).unwrap();
        assert!(relative_eq!(u.discrete_pdf(1), 0.5));
    }

    #[test]
    fn light_strategy_names() {
        assert_eq!("power".parse::<LightSampleStrategy>().unwrap(), LightSampleStrategy::Power);
        let err = "spatial".parse::<LightSampleStrategy>().unwrap_err();
        assert!(err.to_string().contains("spatial"));
    }
}
