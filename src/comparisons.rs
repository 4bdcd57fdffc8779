//! Latency comparison against `std::collections::HashMap`.
//!
//! Run with `cargo test --release -- --ignored --nocapture`.

#[cfg(test)]
mod latency {
    use crate::HashTable;
    use hdrhistogram::Histogram;
    use std::collections::HashMap;
    use std::hint::black_box;
    use std::time::Instant;

    const WARMUP: u64 = 100_000;
    const ITERATIONS: u64 = 1_000_000;
    const KEY_SPACE: u64 = 50_000;

    /// Multiplicative scramble so consecutive iterations hit unrelated keys.
    fn key(i: u64) -> u64 {
        i.wrapping_mul(0x9E37_79B9_7F4A_7C15) % KEY_SPACE
    }

    fn print_histogram(name: &str, hist: &Histogram<u64>, unit: &str) {
        println!("\n=== {} ===", name);
        println!("  count:  {}", hist.len());
        println!("  min:    {} {}", hist.min(), unit);
        println!("  max:    {} {}", hist.max(), unit);
        println!("  mean:   {:.1} {}", hist.mean(), unit);
        println!("  stddev: {:.1} {}", hist.stdev(), unit);
        println!("  p50:    {} {}", hist.value_at_quantile(0.50), unit);
        println!("  p90:    {} {}", hist.value_at_quantile(0.90), unit);
        println!("  p99:    {} {}", hist.value_at_quantile(0.99), unit);
        println!("  p99.9:  {} {}", hist.value_at_quantile(0.999), unit);
        println!("  p99.99: {} {}", hist.value_at_quantile(0.9999), unit);
    }

    // ============================================================
    // Assoc (update-or-insert)
    // ============================================================

    #[test]
    #[ignore]
    fn hdr_assoc_latency_probetable() {
        let mut table: HashTable<u64, u64> = HashTable::new();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        // Warmup
        for i in 0..WARMUP {
            table.assoc(key(i), i);
        }

        // Measure
        for i in 0..ITERATIONS {
            let k = key(i);

            let start = Instant::now();
            let old = table.assoc(k, i);
            let elapsed = start.elapsed().as_nanos() as u64;

            black_box(old);
            hist.record(elapsed).unwrap();
        }

        print_histogram("Assoc Latency (probetable)", &hist, "ns");
    }

    #[test]
    #[ignore]
    fn hdr_insert_latency_std() {
        let mut map: HashMap<u64, u64> = HashMap::new();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for i in 0..WARMUP {
            map.insert(key(i), i);
        }

        for i in 0..ITERATIONS {
            let k = key(i);

            let start = Instant::now();
            let old = map.insert(k, i);
            let elapsed = start.elapsed().as_nanos() as u64;

            black_box(old);
            hist.record(elapsed).unwrap();
        }

        print_histogram("Insert Latency (std HashMap)", &hist, "ns");
    }

    // ============================================================
    // Lookup
    // ============================================================

    #[test]
    #[ignore]
    fn hdr_get_latency_probetable() {
        let table: HashTable<u64, u64> = (0..KEY_SPACE).map(|k| (k, k)).collect();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for i in 0..WARMUP {
            black_box(table.get(&key(i)));
        }

        for i in 0..ITERATIONS {
            // Half the lookups miss.
            let k = key(i) * 2;

            let start = Instant::now();
            let v = table.get(&k);
            let elapsed = start.elapsed().as_nanos() as u64;

            black_box(v);
            hist.record(elapsed).unwrap();
        }

        print_histogram("Get Latency, 50% hit (probetable)", &hist, "ns");
    }

    #[test]
    #[ignore]
    fn hdr_get_latency_std() {
        let map: HashMap<u64, u64> = (0..KEY_SPACE).map(|k| (k, k)).collect();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for i in 0..WARMUP {
            black_box(map.get(&key(i)));
        }

        for i in 0..ITERATIONS {
            let k = key(i) * 2;

            let start = Instant::now();
            let v = map.get(&k);
            let elapsed = start.elapsed().as_nanos() as u64;

            black_box(v);
            hist.record(elapsed).unwrap();
        }

        print_histogram("Get Latency, 50% hit (std HashMap)", &hist, "ns");
    }

    // ============================================================
    // Growth
    // ============================================================

    /// Per-insert latency from an empty table, so the rehash spikes show up
    /// in the tail.
    #[test]
    #[ignore]
    fn hdr_fill_from_empty_probetable() {
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for round in 0..20u64 {
            let mut table: HashTable<u64, u64> = HashTable::new();

            for i in 0..KEY_SPACE {
                let start = Instant::now();
                table.assoc(i ^ round, i);
                let elapsed = start.elapsed().as_nanos() as u64;

                hist.record(elapsed).unwrap();
            }

            black_box(table.capacity());
        }

        print_histogram("Fill From Empty (probetable)", &hist, "ns");
    }

    #[test]
    #[ignore]
    fn hdr_fill_from_empty_std() {
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for round in 0..20u64 {
            let mut map: HashMap<u64, u64> = HashMap::new();

            for i in 0..KEY_SPACE {
                let start = Instant::now();
                map.insert(i ^ round, i);
                let elapsed = start.elapsed().as_nanos() as u64;

                hist.record(elapsed).unwrap();
            }

            black_box(map.capacity());
        }

        print_histogram("Fill From Empty (std HashMap)", &hist, "ns");
    }

    // ============================================================
    // Probe length
    // ============================================================

    /// Distribution of probe steps needed to find each key, measured by
    /// counting predicate calls through the public probe API.
    #[test]
    #[ignore]
    fn hdr_probe_length_distribution() {
        use crate::probe::triangular_probe;

        let table: HashTable<u64, u64> = (0..KEY_SPACE).map(|k| (k, k)).collect();
        let mut hist = Histogram::<u64>::new(3).unwrap();

        let slots: Vec<Option<u64>> = {
            let mut out = vec![None; table.capacity()];
            let mut cursor = table.begin();
            while let Some((k, _)) = cursor.entry() {
                out[cursor.offset()] = Some(*k);
                cursor.advance();
            }
            out
        };

        for k in 0..KEY_SPACE {
            let hash = table.hash(&k);
            let mut steps = 0u64;
            triangular_probe(
                hash as usize,
                table.size_exponent(),
                table.config().stride,
                |idx| {
                    steps += 1;
                    slots[idx].is_none_or(|stored| stored == k)
                },
            );
            hist.record(steps).unwrap();
        }

        println!("\nload factor: {:.3}", table.load_factor());
        print_histogram("Probe Steps per Lookup", &hist, "steps");
    }
}
