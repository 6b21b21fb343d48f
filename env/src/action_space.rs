use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionSpace {
    n: usize,
}

impl ActionSpace {
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "an action space needs at least one action");
        Self { n }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn contains(&self, action: usize) -> bool {
        action < self.n
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.n)
    }
}
