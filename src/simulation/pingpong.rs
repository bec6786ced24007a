/// Two slots of the same field; one is read (last step's output), the other
/// written. Roles flip by index, the data is never copied.
#[derive(Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    current: usize,
}

impl<T> PingPong<T> {
    pub fn new(first: T, second: T) -> Self {
        Self {
            slots: [first, second],
            current: 0,
        }
    }

    pub fn from_fn(mut make: impl FnMut(usize) -> T) -> Self {
        Self::new(make(0), make(1))
    }

    /// Index of the slot holding the latest result.
    pub fn index(&self) -> usize {
        self.current
    }

    /// The latest result.
    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    pub fn get(&self, index: usize) -> &T {
        &self.slots[index & 1]
    }

    /// `(read, write)` for the next step.
    pub fn split(&mut self) -> (&T, &mut T) {
        let [first, second] = &mut self.slots;
        if self.current == 0 {
            (&*first, second)
        } else {
            (&*second, first)
        }
    }

    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }
}
