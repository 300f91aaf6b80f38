pub mod photonmap;
pub mod radius;
pub mod vertex;
pub mod mis;
pub mod ppmprob;
pub mod vcm;
pub mod photonmapping;

pub fn init_stats() {
    photonmap::init_stats();
    vertex::init_stats();
    vcm::init_stats();
}
