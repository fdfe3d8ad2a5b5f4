//! Counter, gauge and vector behavior.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::BTreeMap;
use std::sync::{Arc, Barrier};
use std::thread;

use promscope_core::{Counter, CounterVec, Gauge, GaugeVec, Metric, Opts};

#[test]
fn counter_rejects_negative_delta() {
    let c = Counter::new(Opts::new("hd_errors_total", "Number of hard-disk errors.")).unwrap();
    c.inc();
    let err = c.add(-1.0).expect_err("negative delta must fail");
    assert_eq!(err.class().as_str(), "USAGE");
    assert!(c.add(f64::NAN).is_err());
    assert_eq!(c.get(), 1.0);
}

#[test]
fn counter_adds_compose_into_one_sum() {
    let deltas = [0.5, 2.0, 0.0, 7.25, 1.0];

    let many = Counter::new(Opts::new("a_total", "")).unwrap();
    for d in deltas {
        many.add(d).unwrap();
    }
    let once = Counter::new(Opts::new("b_total", "")).unwrap();
    once.add(deltas.iter().sum()).unwrap();

    assert_eq!(many.get(), once.get());
}

#[test]
fn gauge_moves_both_ways() {
    let g = Gauge::new(Opts::new("cpu_temperature_celsius", "Current temperature of the CPU.")).unwrap();
    g.set(65.5);
    assert_eq!(g.get(), 65.5);
    g.inc();
    g.dec();
    g.sub(5.5);
    assert_eq!(g.get(), 60.0);
    g.add(-70.0);
    assert_eq!(g.get(), -10.0);
}

#[test]
fn label_free_constructor_rejects_labeled_desc() {
    let desc = Opts::new("hd_errors_total", "").describe(&["device"]).unwrap();
    let err = Counter::from_desc(Arc::new(desc)).expect_err("vector descriptor");
    assert_eq!(err.class().as_str(), "USAGE");
}

#[test]
fn vec_checks_arity() {
    let v = CounterVec::new(Opts::new("requests_total", ""), &["code", "method"]).unwrap();
    let err = v.with_label_values(&["200"]).expect_err("arity mismatch");
    assert!(err.to_string().contains("expected 2 values, got 1"), "{err}");
    assert!(v.is_empty());
}

#[test]
fn vec_with_label_map() {
    let v = CounterVec::new(Opts::new("hd_errors_total", ""), &["device"]).unwrap();
    let mut labels = BTreeMap::new();
    labels.insert("device".to_string(), "/dev/sda".to_string());
    v.with(&labels).unwrap().inc();
    v.with(&labels).unwrap().inc();
    assert_eq!(v.with_label_values(&["/dev/sda"]).unwrap().get(), 2.0);

    let mut wrong = BTreeMap::new();
    wrong.insert("disk".to_string(), "/dev/sda".to_string());
    assert!(v.with(&wrong).is_err());
}

#[test]
fn concurrent_first_access_creates_one_point() {
    const N: usize = 16;
    let v = GaugeVec::new(Opts::new("clustermanager_ram_usage_bytes", ""), &["host"]).unwrap();
    let barrier = Arc::new(Barrier::new(N));

    let handles: Vec<_> = (0..N)
        .map(|_| {
            let v = v.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let g = v.with_label_values(&["foo.example.org"]).unwrap();
                g.inc();
                g
            })
        })
        .collect();
    let points: Vec<Gauge> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(v.len(), 1);
    for p in &points[1..] {
        assert!(points[0].same_point(p));
    }
    assert_eq!(points[0].get(), N as f64);
}

#[test]
fn concurrent_increments_are_not_lost() {
    let c = Counter::new(Opts::new("ops_total", "")).unwrap();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let c = c.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    c.inc();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(c.get(), 8000.0);
}

#[test]
fn vec_samples_sorted_by_label_tuple() {
    let v = CounterVec::new(Opts::new("requests_total", ""), &["code", "method"]).unwrap();
    v.with_label_values(&["500", "GET"]).unwrap().inc();
    v.with_label_values(&["200", "POST"]).unwrap().inc();
    v.with_label_values(&["200", "GET"]).unwrap().inc();

    let tuples: Vec<Vec<String>> = v.samples().map(|s| s.label_values).collect();
    assert_eq!(
        tuples,
        vec![
            vec!["200".to_string(), "GET".to_string()],
            vec!["200".to_string(), "POST".to_string()],
            vec!["500".to_string(), "GET".to_string()],
        ]
    );
}
