//! A bounded free-list of receive buffers.
//!
//! Every read takes a buffer from the pool and every handler gives it
//! back on exit, so steady-state traffic allocates nothing per packet.
//! When the pool runs dry a fresh buffer is allocated instead of
//! blocking; a buffer lost to a leaked handler is tolerable.
use bytes::BytesMut;
use crossbeam::queue::ArrayQueue;

use crate::servers::udp::MAX_PACKET_SIZE;

/// How many buffers the free-list holds.
pub const POOL_BUFFERS: usize = 1024;

pub struct BufferPool {
    buffers: ArrayQueue<BytesMut>,
}

impl BufferPool {
    #[must_use]
    pub fn new() -> Self {
        let buffers = ArrayQueue::new(POOL_BUFFERS);

        for _ in 0..POOL_BUFFERS {
            let _ = buffers.push(BytesMut::with_capacity(MAX_PACKET_SIZE));
        }

        Self { buffers }
    }

    /// Takes a buffer, allocating a fresh one when the pool is empty.
    #[must_use]
    pub fn take(&self) -> BytesMut {
        self.buffers
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(MAX_PACKET_SIZE))
    }

    /// Returns a buffer to the pool, cleared for reuse. Excess buffers
    /// beyond the pool bound are dropped.
    pub fn give_back(&self, mut buffer: BytesMut) {
        buffer.clear();
        let _ = self.buffers.push(buffer);
    }

    #[must_use]
    pub fn available(&self) -> usize {
        self.buffers.len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{BufferPool, POOL_BUFFERS};
    use crate::servers::udp::MAX_PACKET_SIZE;

    #[test]
    fn it_should_start_full() {
        assert_eq!(BufferPool::new().available(), POOL_BUFFERS);
    }

    #[test]
    fn a_taken_buffer_should_have_the_packet_capacity() {
        let pool = BufferPool::new();

        assert!(pool.take().capacity() >= MAX_PACKET_SIZE);
    }

    #[test]
    fn a_returned_buffer_should_come_back_empty() {
        let pool = BufferPool::new();

        let mut buffer = pool.take();
        buffer.extend_from_slice(b"leftover bytes");
        pool.give_back(buffer);

        while pool.available() > 0 {
            assert!(pool.take().is_empty());
        }
    }

    #[test]
    fn an_exhausted_pool_should_allocate_instead_of_blocking() {
        let pool = BufferPool::new();

        let taken: Vec<_> = (0..POOL_BUFFERS).map(|_| pool.take()).collect();
        assert_eq!(pool.available(), 0);

        let extra = pool.take();
        assert!(extra.capacity() >= MAX_PACKET_SIZE);

        drop(taken);
    }
}
