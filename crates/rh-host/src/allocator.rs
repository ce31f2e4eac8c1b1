//! Session port allocation

use std::sync::atomic::{AtomicU32, Ordering};

use rh_core::HostError;

/// Hands out session ports from a single shared counter.
///
/// Every call returns the previous value plus one, so concurrent callers
/// each see a distinct port and no value in the range is skipped.
#[derive(Debug)]
pub struct PortAllocator {
    last: AtomicU32,
}

impl PortAllocator {
    /// Create an allocator whose first call returns `first_port`
    pub fn new(first_port: u16) -> Self {
        Self {
            last: AtomicU32::new(u32::from(first_port).saturating_sub(1)),
        }
    }

    /// Allocate the next port
    pub fn next(&self) -> Result<u16, HostError> {
        let port = self.last.fetch_add(1, Ordering::SeqCst) + 1;
        u16::try_from(port).map_err(|_| HostError::PortsExhausted)
    }

    /// Most recently allocated value
    pub fn last(&self) -> u32 {
        self.last.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_sequential_allocation() {
        let allocator = PortAllocator::new(3001);
        assert_eq!(allocator.next().unwrap(), 3001);
        assert_eq!(allocator.next().unwrap(), 3002);
        assert_eq!(allocator.next().unwrap(), 3003);
        assert_eq!(allocator.last(), 3003);
    }

    #[test]
    fn test_exhaustion() {
        let allocator = PortAllocator::new(u16::MAX);
        assert_eq!(allocator.next().unwrap(), u16::MAX);
        assert!(matches!(allocator.next(), Err(HostError::PortsExhausted)));
    }

    #[test]
    fn test_concurrent_allocation_is_dense_and_unique() {
        let allocator = Arc::new(PortAllocator::new(3001));
        let threads = 8;
        let per_thread = 250;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                std::thread::spawn(move || {
                    (0..per_thread)
                        .map(|_| allocator.next().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for port in handle.join().unwrap() {
                assert!(seen.insert(port), "port {} allocated twice", port);
            }
        }

        let expected: HashSet<u16> = (3001..3001 + (threads * per_thread) as u16).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_concurrent_tasks() {
        let allocator = Arc::new(PortAllocator::new(4000));
        let mut tasks = Vec::new();
        for _ in 0..32 {
            let allocator = Arc::clone(&allocator);
            tasks.push(tokio::spawn(async move { allocator.next().unwrap() }));
        }

        let mut ports = Vec::new();
        for task in tasks {
            ports.push(task.await.unwrap());
        }
        ports.sort_unstable();
        assert_eq!(ports, (4000..4032).collect::<Vec<_>>());
    }
}
