mod replay_ring;

pub use replay_ring::ReplayRing;
