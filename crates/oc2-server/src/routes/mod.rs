pub mod debug;
pub mod oc2;
