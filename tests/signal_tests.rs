/* tests/signal_tests.rs */

use livecell::signal::{self, DeriveMode, Derived, Signal, SignalError, batch, untracked};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
	let count = Arc::new(AtomicUsize::new(0));
	let bump = {
		let count = Arc::clone(&count);
		move || {
			count.fetch_add(1, Ordering::SeqCst);
		}
	};
	(count, bump)
}

#[test]
fn test_subscribers_run_in_registration_order() {
	let signal = Signal::new(0);
	let log = Arc::new(Mutex::new(Vec::new()));

	let a = {
		let log = Arc::clone(&log);
		signal.subscribe(move |v| log.lock().push(format!("a{v}")))
	};
	let b = {
		let log = Arc::clone(&log);
		signal.subscribe(move |v| log.lock().push(format!("b{v}")))
	};

	signal.set(1);
	signal.set(2);
	assert_eq!(*log.lock(), vec!["a1", "b1", "a2", "b2"]);
	drop((a, b));
}

#[test]
fn test_unsubscribe_twice_is_harmless() {
	let signal = Signal::new(0);
	let (count, bump) = counter();
	let sub = signal.subscribe(move |_| bump());

	signal.set(1);
	sub.unsubscribe();
	sub.unsubscribe();
	signal.set(2);

	assert!(!sub.is_active());
	assert_eq!(count.load(Ordering::SeqCst), 1);
	assert_eq!(signal.subscriber_count(), 0);
}

#[test]
fn test_dropping_subscription_stops_delivery_but_detach_keeps_it() {
	let signal = Signal::new(0);
	let (dropped, bump_dropped) = counter();
	let (detached, bump_detached) = counter();

	drop(signal.subscribe(move |_| bump_dropped()));
	signal.subscribe(move |_| bump_detached()).detach();

	signal.set(5);
	assert_eq!(dropped.load(Ordering::SeqCst), 0);
	assert_eq!(detached.load(Ordering::SeqCst), 1);
}

#[test]
fn test_panicking_subscriber_is_reported_and_isolated() {
	const MESSAGE: &str = "lamp subscriber exploded";
	let reported = Arc::new(Mutex::new(Vec::new()));
	{
		let reported = Arc::clone(&reported);
		signal::set_error_hook(move |error| {
			if let SignalError::SubscriberPanicked { message, .. } = error
				&& message.contains(MESSAGE)
			{
				reported.lock().push(error.clone());
			}
		});
	}

	let signal = Signal::new(0);
	let _bad = signal.subscribe(|_| panic!("{}", MESSAGE));
	let (count, bump) = counter();
	let _good = signal.subscribe(move |_| bump());

	signal.set(1);

	assert_eq!(*signal.get(), 1);
	assert_eq!(count.load(Ordering::SeqCst), 1);
	assert_eq!(reported.lock().len(), 1);
}

#[test]
fn test_derived_is_lazy_until_read() {
	let source = Signal::new(2);
	let doubled = {
		let source = source.clone();
		Derived::new(move || *source.get() * 2)
	};
	assert_eq!(doubled.computations(), 1);

	source.set(3);
	source.set(4);
	assert!(doubled.is_stale());
	assert_eq!(doubled.computations(), 1);

	assert_eq!(*doubled.get(), 8);
	assert_eq!(doubled.computations(), 2);
	assert_eq!(doubled.mode(), DeriveMode::Lazy);
}

#[test]
fn test_derived_switches_branches() {
	let use_left = Signal::new(true);
	let left = Signal::new("left");
	let right = Signal::new("right");
	let picked = {
		let (use_left, left, right) = (use_left.clone(), left.clone(), right.clone());
		Derived::new(move || if *use_left.get() { *left.get() } else { *right.get() })
	};
	let seen = Arc::new(Mutex::new(Vec::new()));
	let _sub = {
		let seen = Arc::clone(&seen);
		picked.subscribe(move |v| seen.lock().push(*v))
	};

	// Not read yet, so not a dependency.
	right.set("right-2");
	assert!(seen.lock().is_empty());

	use_left.set(false);
	assert_eq!(*seen.lock(), vec!["right-2"]);

	let before = picked.computations();
	left.set("left-2");
	assert_eq!(picked.computations(), before);
	assert_eq!(*seen.lock(), vec!["right-2"]);
}

#[test]
fn test_equal_recompute_notifies_nobody() {
	let number = Signal::new(3);
	let parity = {
		let number = number.clone();
		Derived::new(move || *number.get() % 2)
	};
	let (count, bump) = counter();
	let _sub = parity.subscribe(move |_| bump());

	number.set(5);
	number.set(7);
	assert_eq!(count.load(Ordering::SeqCst), 0);

	number.set(8);
	assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_batch_delivers_once_with_consistent_values() {
	let width = Signal::new(10);
	let height = Signal::new(20);
	let area = {
		let (width, height) = (width.clone(), height.clone());
		Derived::new(move || *width.get() * *height.get())
	};
	let seen = Arc::new(Mutex::new(Vec::new()));
	let _sub = {
		let seen = Arc::clone(&seen);
		area.subscribe(move |v| seen.lock().push(*v))
	};

	batch(|| {
		width.set(3);
		height.set(4);
		assert!(signal::in_batch());
	});

	assert_eq!(*seen.lock(), vec![12]);
	assert!(!signal::in_batch());
}

#[test]
fn test_diamond_never_observes_a_torn_state() {
	let base = Signal::new(1);
	let plus = {
		let base = base.clone();
		Derived::new(move || *base.get() + 1)
	};
	let times = {
		let base = base.clone();
		Derived::new(move || *base.get() * 10)
	};
	let joined = {
		let (plus, times) = (plus.clone(), times.clone());
		Derived::new(move || (*plus.get(), *times.get()))
	};
	let seen = Arc::new(Mutex::new(Vec::new()));
	let _sub = {
		let seen = Arc::clone(&seen);
		joined.subscribe(move |v| seen.lock().push(*v))
	};

	base.set(2);
	base.set(3);
	assert_eq!(*seen.lock(), vec![(3, 20), (4, 30)]);
}

#[test]
fn test_eager_derived_recomputes_without_readers() {
	let source = Signal::new(1);
	let eager = {
		let source = source.clone();
		Derived::eager(move || *source.get() + 100)
	};
	source.set(2);
	assert!(!eager.is_stale());
	assert_eq!(eager.computations(), 2);
	assert_eq!(*eager.get_untracked(), 102);
}

#[test]
fn test_untracked_reads_do_not_subscribe() {
	let tracked = Signal::new(1);
	let ignored = Signal::new(1);
	let sum = {
		let (tracked, ignored) = (tracked.clone(), ignored.clone());
		Derived::new(move || *tracked.get() + untracked(|| *ignored.get()))
	};

	ignored.set(50);
	assert!(!sum.is_stale());
	assert_eq!(*sum.get(), 2);

	tracked.set(2);
	assert_eq!(*sum.get(), 52);
}

#[test]
fn test_write_during_recompute_on_another_thread_is_delivered() {
	use std::sync::Barrier;
	use std::sync::atomic::AtomicBool;

	let source = Signal::new(0);
	let hold = Arc::new(AtomicBool::new(true));
	let barrier = Arc::new(Barrier::new(2));

	let derived = {
		let (source, hold, barrier) = (source.clone(), Arc::clone(&hold), Arc::clone(&barrier));
		Derived::new(move || {
			let value = *source.get();
			if value == 1 && hold.swap(false, Ordering::SeqCst) {
				barrier.wait();
				barrier.wait();
			}
			value
		})
	};

	let seen = Arc::new(Mutex::new(Vec::new()));
	let _sub = {
		let seen = Arc::clone(&seen);
		derived.subscribe(move |v| seen.lock().push(*v))
	};

	let writer = {
		let source = source.clone();
		std::thread::spawn(move || source.set(1))
	};

	// The first write is now stuck inside the computation.
	barrier.wait();
	source.set(2);
	barrier.wait();
	writer.join().unwrap();

	assert_eq!(*source.get_untracked(), 2);
	assert_eq!(seen.lock().last().copied(), Some(2));
	assert!(!derived.is_stale());
	assert_eq!(*derived.get_untracked(), 2);
}
