
#[cfg(test)]
mod render {
    use vcm_rust::core::camera::{Camera, Cameras};
    use vcm_rust::core::film::Film;
    use vcm_rust::core::geometry::point::{Point2i, Point3f};
    use vcm_rust::core::geometry::ray::Ray;
    use vcm_rust::core::geometry::vector::Vector3f;
    use vcm_rust::core::integrator::{
        Integrator, RenderControl, create_integrator, create_light_sample_distribution};
    use vcm_rust::core::parallel::ParallelScheduler;
    use vcm_rust::core::params::RenderParams;
    use vcm_rust::core::pbrt::{Float, INFINITY};
    use vcm_rust::core::sampler::{Sampler, Samplers};
    use vcm_rust::core::scene::Scene;
    use vcm_rust::integrators::photonmap::PhotonMap;
    use vcm_rust::integrators::ppmprob::{PPMProbIntegrator, gather_li};
    use vcm_rust::integrators::radius::{RadiusController, RadiusMode};
    use vcm_rust::integrators::vcm::VCMIntegrator;
    use vcm_rust::samplers::random::RandomSampler;
    use vcm_rust::scenes::create_scene;
    use vcm_rust::init_stats;
    use approx::relative_eq;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn outfile(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vcm_rust_test_{}.png", name))
    }

    fn params(name: &str, overrides: &[&str]) -> RenderParams {
        let mut p = RenderParams::default();
        p.set_all(&["sampleCount=4", "photonCount=2000", "seed=7", "saveEveryIteration=false"]).unwrap();
        p.set_all(overrides).unwrap();
        p.outfile = outfile(name);
        p.validate().unwrap();

        p
    }

    fn setup(scene: &str, p: &RenderParams) -> (Scene, Arc<Cameras>) {
        init_stats();
        create_scene(scene, Point2i::new(8, 8), &p.outfile).unwrap()
    }

    fn pixels(film: &Film) -> Vec<Float> {
        film.bounds().iter().flat_map(|p| film.pixel(&p).to_rgb().to_vec()).collect()
    }

    fn mean(film: &Film) -> Float {
        let values = pixels(film);

        values.iter().sum::<Float>() / values.len() as Float
    }

    /// Mean pixel value of `scene` rendered at 16x16 by `integrator`.
    fn render_mean(scene: &str, integrator: &str, p: &RenderParams) -> Float {
        init_stats();
        let (scene, camera) = create_scene(scene, Point2i::new(16, 16), &p.outfile).unwrap();
        let scheduler = ParallelScheduler::new(4).unwrap();
        let mut integrator = create_integrator(integrator, camera.clone(), p).unwrap();

        integrator.render(&scene, &scheduler, &RenderControl::new()).unwrap();
        assert_valid_image(&camera.film());

        mean(&camera.film())
    }

    fn assert_valid_image(film: &Film) {
        let values = pixels(film);

        assert!(values.iter().all(|v| v.is_finite() && *v >= 0.0), "invalid pixel in {:?}", values);
        assert!(values.iter().any(|v| *v > 0.0), "image is black");
    }

    #[test]
    fn ppm_emitter_floor() {
        let p = params("ppm_emitter_floor", &[]);
        let (scene, camera) = setup("emitter_floor", &p);
        let scheduler = ParallelScheduler::new(2).unwrap();
        let mut integrator = PPMProbIntegrator::new(camera.clone(), p.clone());

        let n = integrator.render(&scene, &scheduler, &RenderControl::new()).unwrap();
        assert_eq!(n, 4);

        // The radius shrank geometrically from its starting value
        let r0 = RadiusController::initial_radius(&p, &scene.world_bound());
        let expected = r0 * p.lookup_radius_ratio.powi(4);
        assert!(relative_eq!(integrator.radius().max_radius(), expected, max_relative = 1.0e-4));
        assert!(integrator.radius().max_radius() < r0);

        assert_valid_image(&camera.film());
        assert!(p.outfile.exists());
    }

    #[test]
    fn ppm_per_pixel_radius() {
        let p = params("ppm_per_pixel", &["radiusMode=perPixel", "sampleCount=3"]);
        let (scene, camera) = setup("emitter_floor", &p);
        let scheduler = ParallelScheduler::new(2).unwrap();
        let mut integrator = PPMProbIntegrator::new(camera.clone(), p.clone());

        integrator.render(&scene, &scheduler, &RenderControl::new()).unwrap();

        let r0 = RadiusController::initial_radius(&p, &scene.world_bound());
        let rmin = r0 * p.lookup_radius_ratio.powi(3);
        assert_eq!(integrator.radius().mode(), RadiusMode::PerPixel);
        for pid in 0..64 {
            let r = integrator.radius().radius(pid);
            assert!(r <= r0 && r >= rmin * 0.999, "pixel {} radius {}", pid, r);
        }
        assert_valid_image(&camera.film());
    }

    #[test]
    fn ppm_is_independent_of_thread_count() {
        let mut images = Vec::new();

        for (i, nthreads) in [1usize, 3].iter().enumerate() {
            let p = params(&format!("ppm_threads_{}", i), &["sampleCount=2"]);
            let (scene, camera) = setup("emitter_floor", &p);
            let scheduler = ParallelScheduler::new(*nthreads).unwrap();
            let mut integrator = PPMProbIntegrator::new(camera.clone(), p);

            integrator.render(&scene, &scheduler, &RenderControl::new()).unwrap();
            images.push(pixels(&camera.film()));
        }

        assert_eq!(images[0], images[1]);
    }

    #[test]
    fn ppm_mirror_sphere() {
        let p = params("ppm_mirror", &["sampleCount=2"]);
        let (scene, camera) = setup("mirror_sphere", &p);
        let scheduler = ParallelScheduler::new(2).unwrap();
        let mut integrator = create_integrator("ppm", camera.clone(), &p).unwrap();

        integrator.render(&scene, &scheduler, &RenderControl::new()).unwrap();
        assert_valid_image(&camera.film());
    }

    #[test]
    fn mirror_bounces_add_no_direct_light() {
        let p = params("mirror_direct", &[]);
        let (scene, camera) = setup("mirror_sphere", &p);
        let light_distr = create_light_sample_distribution(p.light_sample_strategy, &scene).unwrap();
        let photons = PhotonMap::default();
        let mut sampler: Samplers = RandomSampler::new(3).into();

        // Straight down onto the top of the sphere, reflected up into the emitter
        sampler.start_pixel(0);
        let ray = Ray::new(Point3f::new(0.0, 0.95, 0.0), Vector3f::new(0.0, -1.0, 0.0), INFINITY, 0.0, None);
        let g = gather_li(ray, &scene, &mut sampler, &light_distr, &photons, &p, 0.1);
        assert!(g.direct.is_black(), "direct light {} at the mirror", g.direct);
        assert!(relative_eq!(g.l[0], 0.9 * 8.0, max_relative = 1.0e-4));

        // No surface of this scene is glossy, so light sampling never contributes
        let film = camera.film();
        for (i, pixel) in film.bounds().iter().enumerate() {
            sampler.start_pixel(i as u64);
            let (ray, _) = camera.generate_ray(&sampler.get_camera_sample(&pixel));
            let g = gather_li(ray, &scene, &mut sampler, &light_distr, &photons, &p, 0.1);
            assert!(g.direct.is_black());
        }
    }

    #[test]
    fn glossy_bounces_add_direct_light() {
        let p = params("glossy_direct", &[]);
        let (scene, camera) = setup("sky_floor", &p);
        let light_distr = create_light_sample_distribution(p.light_sample_strategy, &scene).unwrap();
        let photons = PhotonMap::default();
        let mut sampler: Samplers = RandomSampler::new(3).into();
        let mut found = 0;

        for i in 0..16 {
            for pixel in camera.film().bounds().iter() {
                sampler.start_pixel((i * 64 + pixel.x + 8 * pixel.y) as u64);
                let (ray, _) = camera.generate_ray(&sampler.get_camera_sample(&pixel));
                let g = gather_li(ray, &scene, &mut sampler, &light_distr, &photons, &p, 0.1);
                if !g.direct.is_black() { found += 1; }
            }
        }

        assert!(found > 0);
    }

    #[test]
    fn sky_lit_ppm_and_vcm_agree() {
        let p = params("sky_lit", &["sampleCount=8", "photonCount=20000"]);
        let ppm = render_mean("sky_floor", "ppm", &p);
        let vcm = render_mean("sky_floor", "vcm", &p);

        assert!(ppm > 0.0 && vcm > 0.0);
        assert!((ppm - vcm).abs() < 0.25 * ppm.max(vcm), "ppm {} vcm {}", ppm, vcm);
    }

    #[test]
    fn point_lit_ppm_and_vcm_agree() {
        let p = params("point_lit", &["sampleCount=8", "photonCount=20000"]);
        let ppm = render_mean("point_floor", "ppm", &p);
        let vcm = render_mean("point_floor", "vcm", &p);

        assert!(ppm > 0.0 && vcm > 0.0);
        assert!((ppm - vcm).abs() < 0.25 * ppm.max(vcm), "ppm {} vcm {}", ppm, vcm);
    }

    #[test]
    fn ppm_in_fog() {
        let p = params("ppm_fog", &["sampleCount=1"]);
        let (scene, camera) = setup("foggy_box", &p);
        let scheduler = ParallelScheduler::new(2).unwrap();
        let mut integrator = create_integrator("ppmprob", camera.clone(), &p).unwrap();

        integrator.render(&scene, &scheduler, &RenderControl::new()).unwrap();
        assert_valid_image(&camera.film());
    }

    #[test]
    fn vcm_cornell_box() {
        let p = params("vcm_cornell", &["sampleCount=2", "maxDepth=4"]);
        let (scene, camera) = setup("cornell_box", &p);
        let scheduler = ParallelScheduler::new(3).unwrap();
        let mut integrator = VCMIntegrator::new(camera.clone(), p.clone());

        let n = integrator.render(&scene, &scheduler, &RenderControl::new()).unwrap();
        assert_eq!(n, 2);
        assert!(integrator.radius().max_radius() > 0.0);
        assert_valid_image(&camera.film());
    }

    #[test]
    fn classic_photon_mapping() {
        let p = params("photonmap", &["sampleCount=2", "gatherRadius=0.2"]);
        let (scene, camera) = setup("emitter_floor", &p);
        let scheduler = ParallelScheduler::new(2).unwrap();
        let mut integrator = create_integrator("photonmap", camera.clone(), &p).unwrap();

        assert_eq!(integrator.render(&scene, &scheduler, &RenderControl::new()).unwrap(), 2);
        assert_valid_image(&camera.film());
    }

    #[test]
    fn snapshots_are_numbered() {
        let p = params("snapshots", &["sampleCount=2", "saveEveryIteration=true"]);
        let (scene, camera) = setup("emitter_floor", &p);
        let scheduler = ParallelScheduler::new(2).unwrap();
        let mut integrator = create_integrator("ppm", camera.clone(), &p).unwrap();

        integrator.render(&scene, &scheduler, &RenderControl::new()).unwrap();

        let film = camera.film();
        assert!(film.snapshot_path(1).exists());
        assert!(film.snapshot_path(2).exists());
        assert!(p.outfile.exists());
    }

    #[test]
    fn stop_before_first_iteration() {
        let p = params("stopped", &[]);
        let (scene, camera) = setup("emitter_floor", &p);
        let scheduler = ParallelScheduler::new(2).unwrap();
        let mut integrator = create_integrator("vcm", camera.clone(), &p).unwrap();

        let control = RenderControl::new();
        control.clone().request_stop();

        assert_eq!(integrator.render(&scene, &scheduler, &control).unwrap(), 0);
        assert!(pixels(&camera.film()).iter().all(|v| *v == 0.0));
    }
}
