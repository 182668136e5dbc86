use crate::sim::ObjectInfo;

/// Two full copies of the population. One is read during a tick, the other
/// receives the results, and they trade places once the tick is complete.
#[derive(Debug)]
pub struct ParticleBuffers {
    buffers: [Vec<ObjectInfo>; 2],
    current: usize,
}

impl ParticleBuffers {
    pub fn new(objects: Vec<ObjectInfo>) -> Self {
        let next = objects.clone();
        Self {
            buffers: [objects, next],
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers[0].is_empty()
    }

    pub fn current(&self) -> &[ObjectInfo] {
        &self.buffers[self.current]
    }

    /// The read-only current buffer together with the writable next buffer.
    pub fn split(&mut self) -> (&[ObjectInfo], &mut [ObjectInfo]) {
        let [a, b] = &mut self.buffers;
        if self.current == 0 {
            (a.as_slice(), b.as_mut_slice())
        } else {
            (b.as_slice(), a.as_mut_slice())
        }
    }

    /// Make the buffer written last tick the current one.
    pub fn flip(&mut self) {
        self.current ^= 1;
    }

    #[cfg(test)]
    fn current_index(&self) -> usize {
        self.current
    }
}
