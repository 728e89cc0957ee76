use indexmap::IndexMap;
use log::warn;

use crate::analyzer::thread::{Thread, ThreadId};

/// One lock/monitor, identified by its opaque dump id.
///
/// Identity is the id alone; the class name is informational and fixed by
/// the first thread that referenced the id.
#[derive(Debug, PartialEq, Eq)]
pub struct Synchronizer {
    pub id: String,
    /// Class name seen at the first reference to this id.
    pub class_name: Option<String>,
    /// Thread currently holding the lock.
    pub lock_holder: Option<ThreadId>,
    /// Threads blocked trying to take the lock.
    pub lock_waiters: Vec<ThreadId>,
    /// Threads waiting for a notification on the lock.
    pub notification_waiters: Vec<ThreadId>,
}

/// Build the cross-referenced synchronizer list for a fully parsed set of
/// threads.
///
/// Two passes: first every referenced id gets exactly one `Synchronizer`
/// (the first reference also fixes the class name), then holders and
/// waiters are filled in. Enumeration order is the order ids were first
/// seen.
pub fn build(threads: &[Thread]) -> Vec<Synchronizer> {
    let mut registry: IndexMap<String, Synchronizer> = IndexMap::new();

    for thread in threads {
        register(&mut registry, thread.want_notification_on.as_deref(), thread);
        register(&mut registry, thread.want_to_acquire.as_deref(), thread);
        for id in &thread.locks_held {
            register(&mut registry, Some(id), thread);
        }
    }

    for (idx, thread) in threads.iter().enumerate() {
        let tid = ThreadId(idx);

        if let Some(id) = &thread.want_notification_on {
            lookup(&mut registry, id).notification_waiters.push(tid);
        }

        if let Some(id) = &thread.want_to_acquire {
            lookup(&mut registry, id).lock_waiters.push(tid);
        }

        for id in &thread.locks_held {
            let synchronizer = lookup(&mut registry, id);
            if let Some(prev) = synchronizer.lock_holder.replace(tid) {
                if prev != tid {
                    warn!(target: "analyzer", "lock {id} claimed by more than one thread");
                }
            }
        }
    }

    registry.into_values().collect()
}

fn register(registry: &mut IndexMap<String, Synchronizer>, id: Option<&str>, thread: &Thread) {
    let Some(id) = id else {
        return;
    };
    if !registry.contains_key(id) {
        registry.insert(
            id.to_string(),
            Synchronizer {
                id: id.to_string(),
                class_name: thread.synchronizer_classes.get(id).cloned(),
                lock_holder: None,
                lock_waiters: vec![],
                notification_waiters: vec![],
            },
        );
    }
}

fn lookup<'a>(
    registry: &'a mut IndexMap<String, Synchronizer>,
    id: &str,
) -> &'a mut Synchronizer {
    registry.get_mut(id).expect("id registered by the first pass")
}

#[cfg(test)]
mod test {
    use crate::analyzer::line::{classify, LineKind};
    use crate::analyzer::sync;
    use crate::analyzer::thread::{Thread, ThreadId};

    fn thread_with_lines(header: &str, lines: &[&str]) -> Thread {
        let mut thread = Thread::from_header(header).unwrap();
        for line in lines {
            thread.apply(classify(line).unwrap());
        }
        thread
    }

    #[test]
    fn test_holder_and_waiter_cross_reference() {
        let holder = thread_with_lines(
            "\"t1\" prio=5 tid=0x01 nid=0x11 runnable",
            &["\t- locked <0xAA> (a java.lang.Object)"],
        );
        let waiter = thread_with_lines(
            "\"t2\" prio=5 tid=0x02 nid=0x12 waiting for monitor entry",
            &["\t- waiting to lock <0xAA> (a java.lang.Object)"],
        );

        let synchronizers = sync::build(&[holder, waiter]);

        assert_eq!(synchronizers.len(), 1);
        let synchronizer = &synchronizers[0];
        assert_eq!(synchronizer.id, "0xAA");
        assert_eq!(synchronizer.class_name.as_deref(), Some("java.lang.Object"));
        assert_eq!(synchronizer.lock_holder, Some(ThreadId(0)));
        assert_eq!(synchronizer.lock_waiters, [ThreadId(1)]);
        assert!(synchronizer.notification_waiters.is_empty());
    }

    #[test]
    fn test_notification_waiter() {
        let waiter = thread_with_lines(
            "\"t1\" prio=5 tid=0x01 nid=0x11 in Object.wait()",
            &["\t- waiting on <0xBB> (a java.util.ArrayList)"],
        );

        let synchronizers = sync::build(&[waiter]);

        assert_eq!(synchronizers.len(), 1);
        assert_eq!(synchronizers[0].notification_waiters, [ThreadId(0)]);
        assert_eq!(synchronizers[0].lock_holder, None);
    }

    #[test]
    fn test_first_seen_class_name_wins() {
        let first = thread_with_lines(
            "\"t1\" prio=5 tid=0x01 nid=0x11 runnable",
            &["\t- locked <0xCC> (a com.example.First)"],
        );
        let second = thread_with_lines(
            "\"t2\" prio=5 tid=0x02 nid=0x12 waiting for monitor entry",
            &["\t- waiting to lock <0xCC> (a com.example.Second)"],
        );

        let synchronizers = sync::build(&[first, second]);
        assert_eq!(
            synchronizers[0].class_name.as_deref(),
            Some("com.example.First")
        );
    }

    #[test]
    fn test_registration_order_is_enumeration_order() {
        let t1 = thread_with_lines(
            "\"t1\" prio=5 tid=0x01 nid=0x11 in Object.wait()",
            &[
                "\t- waiting on <0x03> (a java.lang.Object)",
                "\t- locked <0x01> (a java.lang.Object)",
            ],
        );
        let t2 = thread_with_lines(
            "\"t2\" prio=5 tid=0x02 nid=0x12 waiting for monitor entry",
            &["\t- waiting to lock <0x02> (a java.lang.Object)"],
        );

        // per thread: notification target, acquire target, then held locks
        let ids: Vec<String> = sync::build(&[t1, t2])
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["0x03", "0x01", "0x02"]);
    }

    #[test]
    fn test_last_holder_wins() {
        let t1 = thread_with_lines(
            "\"t1\" prio=5 tid=0x01 nid=0x11 runnable",
            &["\t- locked <0xEE> (a java.lang.Object)"],
        );
        let t2 = thread_with_lines(
            "\"t2\" prio=5 tid=0x02 nid=0x12 runnable",
            &["\t- locked <0xEE> (a java.lang.Object)"],
        );

        let synchronizers = sync::build(&[t1, t2]);
        assert_eq!(synchronizers[0].lock_holder, Some(ThreadId(1)));
    }

    #[test]
    fn test_duplicate_held_lock_single_synchronizer() {
        let mut thread = Thread::from_header("\"t1\" prio=5 tid=0x01 nid=0x11 runnable").unwrap();
        thread.apply(LineKind::HeldLock {
            id: "0xFF".to_string(),
            class_name: "java.lang.Object".to_string(),
        });
        thread.apply(LineKind::HeldLock {
            id: "0xFF".to_string(),
            class_name: "java.lang.Object".to_string(),
        });
        assert_eq!(thread.locks_held.len(), 2);

        let synchronizers = sync::build(&[thread]);
        assert_eq!(synchronizers.len(), 1);
        assert_eq!(synchronizers[0].lock_holder, Some(ThreadId(0)));
    }
}
