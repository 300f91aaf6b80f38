pub mod bvh;

pub fn init_stats() {
    bvh::init_stats();
}
