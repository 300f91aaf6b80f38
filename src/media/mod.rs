pub mod homogeneous;

pub fn init_stats() {
    homogeneous::init_stats();
}
