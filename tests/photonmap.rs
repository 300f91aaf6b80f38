
#[cfg(test)]
mod photon_map {
    use vcm_rust::core::geometry::normal::Normal3f;
    use vcm_rust::core::geometry::point::{Point2i, Point3f};
    use vcm_rust::core::geometry::ray::Ray;
    use vcm_rust::core::geometry::vector::Vector3f;
    use vcm_rust::core::integrator::{LightSampleStrategy, create_light_sample_distribution};
    use vcm_rust::core::material::TransportMode;
    use vcm_rust::core::parallel::{ParallelScheduler, PerThread};
    use vcm_rust::core::pbrt::{Float, INFINITY};
    use vcm_rust::core::rng::RNG;
    use vcm_rust::core::sampler::{Sampler, Samplers};
    use vcm_rust::core::spectrum::Spectrum;
    use vcm_rust::integrators::photonmap::{Photon, PhotonMap, PhotonTracer, photon_seed};
    use vcm_rust::samplers::random::RandomSampler;
    use vcm_rust::scenes::{emitter_floor, mirror_sphere};
    use approx::relative_eq;
    use std::path::Path;

    fn random_photons(n: usize, seed: u64) -> Vec<Photon> {
        let mut rng = RNG::new(seed);

        (0..n)
            .map(|i| {
                let p = Point3f::new(rng.uniform_float(), rng.uniform_float(), 0.0);
                Photon::new(p, Spectrum::new(i as Float), Vector3f::new(0.0, 0.0, 1.0), Normal3f::new(0.0, 0.0, 1.0))
            })
            .collect()
    }

    #[test]
    fn every_photon_is_found_at_its_own_position() {
        let photons = random_photons(257, 3);
        let n = photons.len();
        let map = PhotonMap::new(photons.clone());
        assert_eq!(map.len(), n);

        for ph in photons.iter() {
            let near = map.lookup(&ph.p, n, INFINITY);
            assert_eq!(near.len(), n);
            assert_eq!(near[0].distance, 0.0);
            assert!(near.iter().any(|x| x.distance == 0.0 && x.photon.flux == ph.flux));
        }
    }

    #[test]
    fn photons_behind_a_surface_are_ignored() {
        let (scene, _) = emitter_floor(Point2i::new(2, 2), Path::new("unused.png")).unwrap();
        let mut ray = Ray::new(Point3f::new(0.1, 0.5, 0.1), Vector3f::new(0.0, -1.0, 0.0), INFINITY, 0.0, None);
        let mut si = scene.intersect(&mut ray).unwrap();
        si.compute_scattering_functions(&scene, TransportMode::Radiance);

        // Alternate photons arrive from above and from below the floor
        let mut rng = RNG::new(5);
        let up = Vector3f::new(0.0, 1.0, 0.0);
        let mut front = Vec::new();
        let mut both = Vec::new();
        for i in 0..200 {
            let p = Point3f::new(rng.uniform_float() - 0.5, 0.0, rng.uniform_float() - 0.5);
            let wi = if i % 2 == 0 { up } else { -up };
            let ph = Photon::new(p, Spectrum::new(0.01), wi, Normal3f::new(0.0, 1.0, 0.0));
            if i % 2 == 0 { front.push(ph); }
            both.push(ph);
        }

        let with_back = PhotonMap::new(both).estimate(&si, 200, 0.3);
        let front_only = PhotonMap::new(front).estimate(&si, 200, 0.3);
        assert!(front_only.nphotons > 0);
        assert_eq!(with_back.nphotons, front_only.nphotons);
        assert!(!front_only.l.is_black());
        assert!(relative_eq!(with_back.l[0], front_only.l[0], max_relative = 1.0e-5));
    }

    #[test]
    fn lookups_respect_count_and_radius() {
        let map = PhotonMap::new(random_photons(1000, 9));
        let q = Point3f::new(0.5, 0.5, 0.0);

        for k in [1usize, 5, 32].iter() {
            let near = map.lookup(&q, *k, 0.1);
            assert!(near.len() <= *k);
            assert!(near.iter().all(|n| n.distance <= 0.1));
            assert!(near.windows(2).all(|w| w[0].distance <= w[1].distance));
        }

        // A larger count never finds farther photons first
        let few = map.lookup(&q, 4, 1.0);
        let many = map.lookup(&q, 40, 1.0);
        for (a, b) in few.iter().zip(many.iter()) {
            assert_eq!(a.distance, b.distance);
        }

        assert!(map.lookup(&Point3f::new(5.0, 5.0, 5.0), 10, 0.5).is_empty());
    }

    #[test]
    fn reconstruct_replaces_photons() {
        let mut map = PhotonMap::new(random_photons(10, 1));
        map.construct(random_photons(3, 2));

        assert_eq!(map.len(), 3);
        map.construct(Vec::new());
        assert!(map.is_empty());
    }

    fn trace(scene_name: &str, nthreads: usize) -> Vec<Photon> {
        let res = Point2i::new(4, 4);
        let (scene, _) = match scene_name {
            "mirror_sphere" => mirror_sphere(res, Path::new("unused.png")).unwrap(),
            _               => emitter_floor(res, Path::new("unused.png")).unwrap()
        };
        let light_distr = create_light_sample_distribution(LightSampleStrategy::Power, &scene).unwrap();
        let scheduler = ParallelScheduler::new(nthreads).unwrap();
        let prototype: Samplers = RandomSampler::new(0).into();
        let samplers = PerThread::new(&scheduler, |_| prototype.clone_with_seed(photon_seed(11)));
        let tracer = PhotonTracer { scene: &scene, light_distr: &light_distr, max_depth: 5, rr_depth: 3 };

        tracer.trace(&scheduler, &samplers, 2000)
    }

    #[test]
    fn traced_photons_are_deterministic_and_finite() {
        let a = trace("emitter_floor", 1);
        let b = trace("emitter_floor", 4);

        assert!(!a.is_empty());
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.p, y.p);
            assert!(!x.flux.has_nans() && x.flux.is_finite());
            assert!(x.flux.min_component_value() >= 0.0);
        }

        // Photons on the floor arrive from above
        assert!(a.iter().filter(|ph| ph.p.y.abs() < 1.0e-3).all(|ph| ph.wi.y > 0.0));
    }

    #[test]
    fn no_photons_on_specular_surfaces() {
        let photons = trace("mirror_sphere", 2);
        let center = Point3f::new(0.0, 0.35, 0.0);

        assert!(!photons.is_empty());
        // The sphere touches the floor at the origin
        assert!(photons
            .iter()
            .filter(|ph| ph.p.y > 1.0e-2)
            .all(|ph| (ph.p.distance(&center) - 0.35).abs() > 1.0e-3));
    }
}
