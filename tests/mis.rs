
#[cfg(test)]
mod mis_weights {
    use bumpalo_herd::Herd;
    use vcm_rust::core::camera::Cameras;
    use vcm_rust::core::geometry::point::{Point2f, Point2i};
    use vcm_rust::core::integrator::{LightSampleStrategy, create_light_sample_distribution};
    use vcm_rust::core::pbrt::{Float, PI};
    use vcm_rust::core::sampler::{Sampler, Samplers};
    use vcm_rust::core::scene::Scene;
    use vcm_rust::integrators::mis::calc_weight_sum;
    use vcm_rust::integrators::vcm::{MergeContext, connect_vcm};
    use vcm_rust::integrators::vertex::{
        Path, PathContext, Vertex, VertexType, WalkParams,
        generate_camera_subpath, generate_light_subpath};
    use vcm_rust::samplers::random::RandomSampler;
    use vcm_rust::scenes::create_scene;
    use approx::relative_eq;
    use std::path::Path as FsPath;
    use std::sync::Arc;

    const RES: i32 = 16;

    fn build(name: &str) -> (Scene, Arc<Cameras>) {
        create_scene(name, Point2i::new(RES, RES), FsPath::new("unused.png")).unwrap()
    }

    // Sum of the camera-side ratios alone for a connection of the first light
    // vertex to `camera[1]`.
    fn camera_side_sum(ctx: &PathContext, light: &[Vertex], camera: &[Vertex]) -> Float {
        let remap = |f: Float| if f != 0.0 { f } else { 1.0 };

        1.0 + remap(light[0].pdf_light(ctx.scene, &camera[1])) / remap(camera[1].pdf_fwd)
    }

    fn snapshot(path: &[Vertex]) -> Vec<(Float, Float, bool)> {
        path.iter().map(|v| (v.pdf_fwd, v.pdf_rev, v.delta)).collect()
    }

    /// Calls `check` with a camera and a light subpath for `n` pixel samples.
    fn for_each_path_pair<F>(name: &str, n: usize, mut check: F)
    where F: for<'v> FnMut(&PathContext, &mut [Vertex<'v>], &mut [Vertex<'v>], &mut Samplers)
    {
        let (scene, camera) = build(name);
        let light_distr = create_light_sample_distribution(LightSampleStrategy::Power, &scene).unwrap();
        let ctx = PathContext { scene: &scene, camera: &camera, light_distr: &light_distr };
        let walk = WalkParams { max_vertices: 7, rr_depth: 3 };
        let mut sampler: Samplers = RandomSampler::new(21).into();
        let herd = Herd::new();
        let member = herd.get();

        for i in 0..n {
            sampler.start_pixel(i as u64);
            let pid = i % (RES * RES) as usize;
            let u = sampler.get_2d();
            let p_film = Point2f::new((pid % RES as usize) as Float + u.x, (pid / RES as usize) as Float + u.y);

            let mut cpath = Path::with_capacity(walk.max_vertices);
            let mut lpath = Path::with_capacity(walk.max_vertices);
            generate_camera_subpath(&ctx, &mut sampler, &member, walk, &p_film, &mut cpath);
            generate_light_subpath(&ctx, &mut sampler, &member, walk, 0.0, &mut lpath);

            check(&ctx, &mut lpath, &mut cpath, &mut sampler);
        }
    }

    #[test]
    fn sampled_vertices_have_positive_density() {
        for_each_path_pair("cornell_box", 512, |_, light, camera, _| {
            for path in [&*light, &*camera].iter() {
                for i in 1..path.len() {
                    let v = &path[i];
                    if path[i - 1].delta || v.beta.is_black() { continue; }
                    assert!(v.pdf_fwd > 0.0, "vertex {} of {:?} has pdfFwd {}", i, v.vtype, v.pdf_fwd);
                }
            }
            if let Some(v) = light.first() {
                assert!(v.pdf_fwd > 0.0);
            }
        });
    }

    #[test]
    fn two_vertex_paths_have_unit_weight() {
        for_each_path_pair("cornell_box", 64, |ctx, light, camera, _| {
            if camera.len() >= 2 {
                assert_eq!(calc_weight_sum(ctx, light, camera, None, 0, 2), 1.0);
            }
            if !light.is_empty() {
                assert_eq!(calc_weight_sum(ctx, light, camera, None, 1, 1), 1.0);
            }
        });
    }

    #[test]
    fn weights_leave_paths_untouched() {
        let mut checked = 0;

        for_each_path_pair("cornell_box", 256, |ctx, light, camera, _| {
            let (cbefore, lbefore) = (snapshot(camera), snapshot(light));

            for cid in 2..=camera.len() {
                for lid in 1..=light.len() {
                    let (vc, vl) = (camera[cid - 1], light[lid - 1]);
                    if !vc.is_on_surface() || !vc.is_connectible() || !vl.is_connectible() { continue; }

                    let w = calc_weight_sum(ctx, light, camera, None, lid, cid);
                    assert!(w >= 1.0, "weight sum {} for ({}, {})", w, lid, cid);
                    checked += 1;
                }
            }

            assert_eq!(snapshot(camera), cbefore);
            assert_eq!(snapshot(light), lbefore);
        });

        assert!(checked > 0);
    }

    #[test]
    fn specular_paths_have_a_single_strategy() {
        let mut found = 0;

        // Camera -> mirror -> emitter can only be sampled by hitting the light
        for_each_path_pair("mirror_sphere", 4096, |ctx, light, camera, _| {
            // Escaped rays end in a light vertex too; only emitting surfaces count
            if camera.len() < 3 || !camera[1].delta { return; }
            if camera[2].vtype != VertexType::Surface || !camera[2].is_light(ctx.scene) { return; }

            assert_eq!(calc_weight_sum(ctx, light, camera, None, 0, 3), 1.0);
            found += 1;
        });

        assert!(found > 0);
    }

    #[test]
    fn point_light_origin_has_no_strategy() {
        let mut found = 0;

        for_each_path_pair("point_floor", 256, |ctx, light, camera, _| {
            if camera.len() < 2 || light.is_empty() || !camera[1].is_connectible() { return; }
            assert!(light[0].is_delta_light());

            // Hitting a point light is impossible, so only light tracing competes
            let expected = camera_side_sum(ctx, light, camera);
            let w = calc_weight_sum(ctx, light, camera, None, 1, 2);
            assert!(relative_eq!(w, expected, max_relative = 1.0e-5), "{} != {}", w, expected);
            found += 1;
        });

        assert!(found > 0);
    }

    #[test]
    fn area_light_origin_is_a_strategy() {
        let mut found = 0;

        for_each_path_pair("emitter_floor", 256, |ctx, light, camera, _| {
            if camera.len() < 2 || light.is_empty() || !camera[1].is_connectible() { return; }
            if camera[1].p().y > 0.01 { return; }
            assert!(!light[0].is_delta_light());

            let w = calc_weight_sum(ctx, light, camera, None, 1, 2);
            assert!(w > camera_side_sum(ctx, light, camera));
            found += 1;
        });

        assert!(found > 0);
    }

    #[test]
    fn escaped_vertices_carry_the_sky() {
        let mut found = 0;

        for_each_path_pair("sky_floor", 512, |ctx, _, camera, _| {
            let last = match camera.last() {
                Some(v) if v.is_infinite_light() => *v,
                _ => return
            };
            assert_eq!(last.vtype, VertexType::Light);
            let prev = camera[camera.len() - 2];

            let le = last.le(ctx.scene, &prev);
            assert!(relative_eq!(le[0], 0.5) && relative_eq!(le[2], 0.5));

            // The sky is the only light: uniform over the sphere of directions
            let origin = last.pdf_light_origin(ctx, &prev);
            assert!(relative_eq!(origin, 1.0 / (4.0 * PI), max_relative = 1.0e-4));

            if prev.vtype == VertexType::Camera {
                let (_, r) = ctx.scene.world_bound().bounding_sphere();
                let pdf = last.pdf_light(ctx.scene, &prev);
                assert!(relative_eq!(pdf, 1.0 / (PI * r * r), max_relative = 1.0e-4));
            }
            found += 1;
        });

        assert!(found > 0);
    }

    #[test]
    fn no_light_sampling_at_mirror_vertices() {
        let mut found = 0;

        for_each_path_pair("mirror_sphere", 1024, |ctx, light, camera, sampler| {
            if camera.len() < 2 || !camera[1].delta || light.is_empty() { return; }
            let merge = MergeContext { photon_maps: &[], lookup_size: 8, radius: 0.1, npaths: 1 };

            let c = connect_vcm(ctx, light, camera, 1, 2, &merge, sampler);
            assert!(c.l.is_black());
            assert!(!c.merged);
            found += 1;
        });

        assert!(found > 0);
    }
}
