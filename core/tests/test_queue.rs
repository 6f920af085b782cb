#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use filecrypt_core::pool::{BlockingQueue, QueueError};

    // # ✅ 1. Buffering and FIFO order
    #[test]
    fn buffered_items_come_out_in_put_order() {
        let q = BlockingQueue::new();
        for i in 0..5 {
            q.put(i);
        }
        assert_eq!(q.size(), 5);

        let out: Vec<i32> = (0..5).map(|_| q.take().wait().unwrap()).collect();
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
        assert_eq!(q.size(), 0);
    }

    // # ✅ 2. Direct handoff to a waiting consumer
    #[test]
    fn put_hands_item_to_blocked_taker() {
        let q = BlockingQueue::new();
        let consumer = {
            let q = q.clone();
            thread::spawn(move || q.take().wait())
        };

        while q.waiting() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        q.put("job");

        assert_eq!(consumer.join().unwrap(), Ok("job"));
        assert_eq!(q.size(), 0, "handoff must not buffer");
    }

    #[test]
    fn waiters_are_served_first_come_first_served() {
        let q: BlockingQueue<u32> = BlockingQueue::new();
        let first = q.take();
        let second = q.take();
        assert_eq!(q.waiting(), 2);

        q.put(1);
        q.put(2);

        assert_eq!(first.wait(), Ok(1));
        assert_eq!(second.wait(), Ok(2));
    }

    // # ✅ 3. Cancellation never loses an item
    #[test]
    fn cancelled_take_returns_raced_item() {
        let q = BlockingQueue::new();
        let take = q.take();
        q.put(7u8);
        assert_eq!(take.cancel(), Some(7));
        assert_eq!(q.size(), 0);
    }

    #[test]
    fn cancelled_waiter_is_skipped_by_put() {
        let q = BlockingQueue::new();
        let abandoned = q.take();
        assert_eq!(abandoned.cancel(), None);
        assert_eq!(q.waiting(), 0);

        q.put(9u8);
        assert_eq!(q.size(), 1);
        assert_eq!(q.take().wait(), Ok(9));
    }

    #[test]
    fn raced_item_given_back_keeps_its_place() {
        let q = BlockingQueue::new();
        let take = q.take();
        q.put(1u8);
        q.put(2);
        q.put(3);

        let raced = take.cancel().unwrap();
        q.put_front(raced);

        let out: Vec<u8> = (0..3).map(|_| q.take().wait().unwrap()).collect();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn put_front_still_hands_off_to_waiters() {
        let q = BlockingQueue::new();
        let waiter = q.take();
        q.put_front(5u8);
        assert_eq!(q.size(), 0);
        assert_eq!(waiter.wait(), Ok(5));
    }

    // # ✅ 4. clear()
    #[test]
    fn clear_drops_items_and_rejects_waiters() {
        let q: BlockingQueue<u8> = BlockingQueue::new();
        let waiter = q.take();
        q.clear();
        assert_eq!(waiter.wait(), Err(QueueError::Cleared));

        q.put(1);
        q.put(2);
        q.clear();
        assert_eq!(q.size(), 0);
    }

    // # ✅ 5. Size subscription
    #[test]
    fn size_subscriber_sees_current_value_then_changes() {
        let q = BlockingQueue::new();
        q.put(1u8);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        q.subscribe_size(move |n| sink.lock().unwrap().push(n));

        q.put(2);
        let _ = q.take().wait();
        q.clear();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1, 0]);
    }

    // # ✅ 6. Many producers, many consumers
    #[test]
    fn every_item_is_taken_exactly_once() {
        let q = BlockingQueue::new();
        let taken = Arc::new(AtomicUsize::new(0));
        let sum = Arc::new(AtomicUsize::new(0));

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let (q, taken, sum) = (q.clone(), Arc::clone(&taken), Arc::clone(&sum));
                thread::spawn(move || {
                    for _ in 0..250 {
                        let v: usize = q.take().wait().unwrap();
                        sum.fetch_add(v, Ordering::SeqCst);
                        taken.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let q = q.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        q.put(p * 250 + i);
                    }
                })
            })
            .collect();

        for h in producers.into_iter().chain(consumers) {
            h.join().unwrap();
        }
        assert_eq!(taken.load(Ordering::SeqCst), 1000);
        assert_eq!(sum.load(Ordering::SeqCst), (0..1000).sum::<usize>());
        assert_eq!(q.size(), 0);
    }
}
