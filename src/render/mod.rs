pub mod blur;
pub mod composite;
pub mod cpu;
pub mod encode;
pub mod gradient;
pub mod plan;
pub mod surface;
