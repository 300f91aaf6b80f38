use smallvec::SmallVec;
use crate::core::pbrt::Float;
use super::vertex::{PathContext, Vertex};

/// Vertices changed for the duration of one weight computation. `restore`
/// puts the saved copies back.
#[derive(Default)]
struct SavedVertices<'a> {
    light   : SmallVec<[(usize, Vertex<'a>); 2]>,
    camera  : SmallVec<[(usize, Vertex<'a>); 2]>
}

impl<'a> SavedVertices<'a> {
    fn capture(light_path: &[Vertex<'a>], camera_path: &[Vertex<'a>], lid: usize, cid: usize) -> Self {
        let mut saved = SavedVertices::default();
        for i in lid.saturating_sub(2)..lid { saved.light.push((i, light_path[i])); }
        for i in cid.saturating_sub(2)..cid { saved.camera.push((i, camera_path[i])); }

        saved
    }

    fn restore(self, light_path: &mut [Vertex<'a>], camera_path: &mut [Vertex<'a>]) {
        for (i, v) in self.light { light_path[i] = v; }
        for (i, v) in self.camera { camera_path[i] = v; }
    }
}

// Deltas map to 1 so that they cancel out of the ratios
#[inline]
fn remap0(f: Float) -> Float {
    if f != 0.0 { f } else { 1.0 }
}

/// Sum of the density ratios of all strategies that produce the path made of
/// the first `lid` light vertices and the first `cid` camera vertices,
/// relative to the strategy that sampled it. The balance heuristic weight of
/// the connection is the reciprocal.
///
/// `sampled` is the endpoint created for the connection. It stands in for
/// the first light vertex when `lid == 1` or the first camera vertex when
/// `cid == 1`. The paths are left as they were found.
pub fn calc_weight_sum<'a>(
    ctx: &PathContext, light_path: &mut [Vertex<'a>], camera_path: &mut [Vertex<'a>],
    sampled: Option<Vertex<'a>>, lid: usize, cid: usize) -> Float {
    if lid + cid == 2 { return 1.0; }
    debug_assert!(cid >= 1 && lid <= light_path.len() && cid <= camera_path.len());

    let saved = SavedVertices::capture(light_path, camera_path, lid, cid);
    let sum = weight_sum_with_overrides(ctx, light_path, camera_path, sampled, lid, cid);
    saved.restore(light_path, camera_path);

    sum
}

fn weight_sum_with_overrides<'a>(
    ctx: &PathContext, light_path: &mut [Vertex<'a>], camera_path: &mut [Vertex<'a>],
    sampled: Option<Vertex<'a>>, lid: usize, cid: usize) -> Float {
    // Connect the subpaths through the sampled endpoint
    if let Some(s) = sampled {
        if lid == 1 {
            light_path[0] = s;
        } else if cid == 1 {
            camera_path[0] = s;
        }
    }

    let vc = camera_path[cid - 1];
    let vc_minus = if cid > 1 { Some(camera_path[cid - 2]) } else { None };
    let vl = if lid > 0 { Some(light_path[lid - 1]) } else { None };
    let vl_minus = if lid > 1 { Some(light_path[lid - 2]) } else { None };

    // Reverse densities at the connection, from the other subpath
    camera_path[cid - 1].pdf_rev = match (vl, vc_minus) {
        (Some(ref vl), _)     => vl.pdf(ctx, vl_minus.as_ref(), &vc),
        (None, Some(ref vcm)) => vc.pdf_light_origin(ctx, vcm),
        (None, None)          => 0.0
    };
    if let Some(ref vcm) = vc_minus {
        camera_path[cid - 2].pdf_rev = match vl {
            Some(ref vl) => vc.pdf(ctx, Some(vl), vcm),
            None         => vc.pdf_light(ctx.scene, vcm)
        };
    }
    if let Some(ref vl) = vl {
        light_path[lid - 1].pdf_rev = vc.pdf(ctx, vc_minus.as_ref(), vl);
        if let Some(ref vlm) = vl_minus {
            light_path[lid - 2].pdf_rev = vl.pdf(ctx, Some(&vc), vlm);
        }
    }

    // Vertices at the connection are never treated as specular
    camera_path[cid - 1].delta = false;
    if lid > 0 { light_path[lid - 1].delta = false; }

    let mut sum_ri = 0.0;

    // Consider hypothetical connection strategies along the camera subpath
    let mut ri = 1.0;
    for i in (1..cid).rev() {
        ri *= remap0(camera_path[i].pdf_rev) / remap0(camera_path[i].pdf_fwd);
        if !camera_path[i].delta && !camera_path[i - 1].delta {
            sum_ri += ri;
        }
    }

    // Consider hypothetical connection strategies along the light subpath
    let mut ri = 1.0;
    for i in (0..lid).rev() {
        ri *= remap0(light_path[i].pdf_rev) / remap0(light_path[i].pdf_fwd);
        let delta_light_vertex = if i > 0 {
            light_path[i - 1].delta
        } else {
            light_path[0].is_delta_light()
        };
        if !light_path[i].delta && !delta_light_vertex {
            sum_ri += ri;
        }
    }

    1.0 + sum_ri
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_keeps_nonzero_values() {
        assert_eq!(remap0(0.0), 1.0);
        assert_eq!(remap0(0.25), 0.25);
    }
}
