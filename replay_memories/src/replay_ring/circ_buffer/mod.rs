/// Fixed-capacity ring. Grows until `max_size` values are held, after which
/// every push overwrites the oldest value at `head`.
pub struct CircBuffer<V> {
    values: Vec<V>,
    max_size: usize,
    head: usize,
}

impl<V> CircBuffer<V> {
    pub fn with_max_size(max_size: usize) -> Self {
        assert!(max_size > 0, "CircBuffer must have a nonzero max size");
        Self {
            // the ring may be far larger than what a run ever fills, so
            // storage is allocated lazily rather than up front
            values: Vec::new(),
            max_size,
            head: 0,
        }
    }

    pub fn push(&mut self, value: V) {
        if self.values.len() < self.max_size {
            self.values.push(value);
        } else {
            self.values[self.head] = value;
        }
        self.head += 1;
        if self.head == self.max_size {
            self.head = 0;
        }
    }

    pub fn get(&self, index: usize) -> Option<&V> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.max_size
    }

    /// Values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        let split = if self.is_full() { self.head } else { 0 };
        let (newer, older) = self.values.split_at(split);
        older.iter().chain(newer.iter())
    }
}
