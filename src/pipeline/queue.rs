use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;

/// 処理スレッドへのフレーム投入口
///
/// キューが満杯（処理中）なら新しいフレームは捨てて数える。
pub struct FrameSender<F> {
    tx: SyncSender<F>,
    dropped: Arc<AtomicU64>,
}

impl<F> Clone for FrameSender<F> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }
}

impl<F> FrameSender<F> {
    /// 受け付けたら true。満杯なら false、受信側が居なければ `Err`
    pub fn offer(&self, frame: F) -> Result<bool, mpsc::SendError<F>> {
        match self.tx.try_send(frame) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Ok(false)
            }
            Err(TrySendError::Disconnected(frame)) => Err(mpsc::SendError(frame)),
        }
    }

    /// 捨てたフレーム数を読み出してリセット
    pub fn take_dropped(&self) -> u64 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

/// 長さ `depth`（最低1）のフレームキューを作る
pub fn frame_channel<F>(depth: usize) -> (FrameSender<F>, Receiver<F>) {
    let (tx, rx) = mpsc::sync_channel(depth.max(1));
    let sender = FrameSender {
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (sender, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_when_full() {
        let (tx, rx) = frame_channel::<u32>(1);
        assert!(tx.offer(1).unwrap());
        assert!(!tx.offer(2).unwrap());
        assert!(!tx.offer(3).unwrap());
        assert_eq!(tx.take_dropped(), 2);
        assert_eq!(tx.take_dropped(), 0);

        assert_eq!(rx.recv().unwrap(), 1);
        assert!(tx.offer(4).unwrap());
        assert_eq!(rx.recv().unwrap(), 4);
    }

    #[test]
    fn test_zero_depth_is_one() {
        let (tx, _rx) = frame_channel::<u32>(0);
        assert!(tx.offer(1).unwrap());
    }

    #[test]
    fn test_disconnected() {
        let (tx, rx) = frame_channel::<u32>(1);
        drop(rx);
        assert!(tx.offer(1).is_err());
    }
}
