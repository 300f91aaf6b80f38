
#[cfg(test)]
mod params {
    use vcm_rust::core::geometry::bounds::Bounds3f;
    use vcm_rust::core::geometry::point::{Point2i, Point3f};
    use vcm_rust::accelerators::bvh::BVHAccel;
    use vcm_rust::core::integrator::{Integrator, LightSampleStrategy, RenderControl, create_integrator};
    use vcm_rust::core::parallel::ParallelScheduler;
    use vcm_rust::core::scene::Scene;
    use vcm_rust::core::params::RenderParams;
    use vcm_rust::integrators::radius::{RadiusController, RadiusMode};
    use vcm_rust::scenes::{create_scene, emitter_floor};
    use approx::relative_eq;
    use std::path::Path;

    fn error_for(assignment: &str) -> String {
        let mut p = RenderParams::default();
        match p.set_all(&[assignment]).and_then(|_| p.validate()) {
            Ok(_)  => panic!("\"{}\" was accepted", assignment),
            Err(e) => format!("{:#}", e)
        }
    }

    #[test]
    fn defaults_are_valid() {
        let p = RenderParams::default();

        assert!(p.validate().is_ok());
        assert_eq!(p.sample_count, 16);
        assert_eq!(p.lookup_size, 32);
        assert_eq!(p.radius_mode, RadiusMode::Global);
        assert_eq!(p.light_sample_strategy, LightSampleStrategy::Power);
        assert!(relative_eq!(p.lookup_radius_ratio, 0.8));
    }

    #[test]
    fn validation_names_the_key() {
        assert!(error_for("sampleCount=0").contains("sampleCount"));
        assert!(error_for("lookupSize=0").contains("lookupSize"));
        assert!(error_for("lookupRadiusRatio=1.0").contains("lookupRadiusRatio"));
        assert!(error_for("lookupRadiusRatio=0").contains("lookupRadiusRatio"));
        assert!(error_for("gatherRadius=-1").contains("gatherRadius"));
        assert!(error_for("lightSampleStrategy=spatial").contains("spatial"));
        assert!(error_for("radiusMode=tiled").contains("tiled"));
        assert!(error_for("photonCount=many").contains("photonCount"));
        assert!(error_for("nosuchkey=1").contains("nosuchkey"));
    }

    #[test]
    fn unknown_names_are_errors() {
        let (_, camera) = emitter_floor(Point2i::new(2, 2), Path::new("unused.png")).unwrap();

        let err = create_integrator("bdpt", camera, &RenderParams::default()).err().unwrap();
        assert!(err.to_string().contains("bdpt"));
        assert!(create_scene("sponza", Point2i::new(2, 2), Path::new("unused.png")).is_err());
    }

    #[test]
    fn invalid_params_stop_integrator_creation() {
        let (_, camera) = emitter_floor(Point2i::new(2, 2), Path::new("unused.png")).unwrap();
        let mut p = RenderParams::default();
        p.lookup_size = 0;

        assert!(create_integrator("vcm", camera, &p).is_err());
    }

    #[test]
    fn scene_without_lights_is_an_error() {
        let (_, camera) = emitter_floor(Point2i::new(2, 2), Path::new("unused.png")).unwrap();
        let scene = Scene::new(BVHAccel::new(Vec::new(), 4), Vec::new(), Vec::new());
        let scheduler = ParallelScheduler::new(1).unwrap();

        for name in &["ppm", "vcm", "photonmap"] {
            let mut integrator = create_integrator(name, camera.clone(), &RenderParams::default()).unwrap();
            let err = integrator.render(&scene, &scheduler, &RenderControl::new()).unwrap_err();
            assert!(err.to_string().contains("no lights"), "{}: {}", name, err);
        }
    }

    #[test]
    fn radius_decays_from_scene_extent() {
        let bounds = Bounds3f::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0));
        let mut p = RenderParams::default();
        let r0 = RadiusController::initial_radius(&p, &bounds);
        assert!(relative_eq!(r0, 0.125 * 3.0f32.sqrt(), max_relative = 1.0e-5));

        p.gather_radius = Some(0.5);
        assert_eq!(RadiusController::initial_radius(&p, &bounds), 0.5);

        let mut rc = RadiusController::new(RadiusMode::Global, 0.6);
        rc.initialize(r0, 16);
        let mut last = rc.max_radius();
        for k in 1..=8 {
            rc.decay();
            let r = rc.max_radius();
            assert!(r < last);
            assert!(relative_eq!(r, r0 * 0.6f32.powi(k), max_relative = 1.0e-4));
            last = r;
        }
    }
}
