//! A fixed set of charts shared by concurrent parses.

use std::ops::{Deref, DerefMut};

use parking_lot::{Condvar, Mutex};

use crate::chart::Chart;

/// Idle charts plus a condition variable to wait on when there are none.
#[derive(Debug, Default)]
pub struct WorkspacePool {
  idle: Mutex<Vec<Chart>>,
  returned: Condvar,
}

impl WorkspacePool {
  /// A pool of `count` charts, each holding sentences of up to `words` entries.
  pub fn new(count: usize, words: usize, states: usize) -> Self {
    tracing::info!("allocating {} workspaces of sentence length {}", count, words);
    Self {
      idle: Mutex::new((0..count).map(|_| Chart::new(words, states)).collect()),
      returned: Condvar::new(),
    }
  }

  pub fn add(&self, chart: Chart) {
    self.idle.lock().push(chart);
    self.returned.notify_one();
  }

  /// Blocks until a chart is idle. The chart goes back to the pool when the
  /// guard drops, whether or not the parse using it succeeded.
  pub fn acquire(&self) -> PooledChart<'_> {
    let mut idle = self.idle.lock();
    loop {
      if let Some(chart) = idle.pop() {
        return PooledChart {
          pool: self,
          chart: Some(chart),
        };
      }
      self.returned.wait(&mut idle);
    }
  }

  /// Number of charts not currently lent out
  pub fn available(&self) -> usize {
    self.idle.lock().len()
  }
}

/// A chart on loan from a [`WorkspacePool`].
#[derive(Debug)]
pub struct PooledChart<'a> {
  pool: &'a WorkspacePool,
  chart: Option<Chart>,
}

impl Deref for PooledChart<'_> {
  type Target = Chart;

  fn deref(&self) -> &Chart {
    self.chart.as_ref().unwrap_or_else(|| unreachable!("chart taken before drop"))
  }
}

impl DerefMut for PooledChart<'_> {
  fn deref_mut(&mut self) -> &mut Chart {
    self.chart.as_mut().unwrap_or_else(|| unreachable!("chart taken before drop"))
  }
}

impl Drop for PooledChart<'_> {
  fn drop(&mut self) {
    if let Some(chart) = self.chart.take() {
      self.pool.add(chart);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::thread;
  use std::time::Duration;

  #[test]
  fn test_guard_returns_chart() {
    let pool = WorkspacePool::new(2, 4, 3);
    assert_eq!(pool.available(), 2);
    {
      let a = pool.acquire();
      let _b = pool.acquire();
      assert_eq!(a.capacity(), 4);
      assert_eq!(pool.available(), 0);
    }
    assert_eq!(pool.available(), 2);

    pool.add(Chart::new(8, 3));
    assert_eq!(pool.available(), 3);
  }

  #[test]
  fn test_acquire_blocks_until_release() {
    let pool = WorkspacePool::new(1, 4, 3);
    let in_use = AtomicUsize::new(0);
    let max_in_use = AtomicUsize::new(0);

    thread::scope(|s| {
      for _ in 0..4 {
        s.spawn(|| {
          let mut chart = pool.acquire();
          let now = in_use.fetch_add(1, Ordering::SeqCst) + 1;
          max_in_use.fetch_max(now, Ordering::SeqCst);
          chart.clear(4);
          thread::sleep(Duration::from_millis(5));
          in_use.fetch_sub(1, Ordering::SeqCst);
        });
      }
    });

    assert_eq!(max_in_use.load(Ordering::SeqCst), 1);
    assert_eq!(pool.available(), 1);
  }
}
