/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Empty cell roughly `rate` of the time.
fn maybe(rng: &mut SimpleRng, rate: f64, value: String) -> String {
    if rng.next_f64() < rate { String::new() } else { value }
}

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = "sample_plots.csv";
    let mut writer = csv::Writer::from_path(output_path)?;

    writer.write_record([
        "PLT_CN", "INVYR", "BIO_ACRE", "DIA", "HT", "ELEV", "CNT", "BURNED", "longitude",
        "latitude",
    ])?;

    let n_plots = 800;
    for i in 0..n_plots {
        let year = 2011 + (i % 5) as i64;
        let longitude = rng.uniform(-124.2, -117.2);
        let latitude = rng.uniform(42.1, 46.0);

        // Higher ground in the east, Cascades in the middle.
        let elevation = (300.0 + (longitude + 124.2) * 180.0 + rng.gauss(0.0, 350.0)).max(0.0);
        let burned = rng.next_f64() < 0.12 + elevation / 20000.0;

        let mut height = (75.0 - 0.004 * elevation + rng.gauss(0.0, 14.0)).max(5.0);
        let mut diameter = (4.0 + height * 0.18 + rng.gauss(0.0, 2.5)).max(1.0);
        if i % 97 == 13 {
            height *= 120.0;
        }
        if i % 131 == 7 {
            diameter *= 30.0;
        }
        let tree_count = (rng.uniform(1.0, 40.0)) as i64;
        let biomass = (tree_count as f64 * diameter * 0.35 + rng.gauss(0.0, 6.0)).max(0.0);

        writer.write_record([
            format!("41{i:06}"),
            year.to_string(),
            maybe(&mut rng, 0.01, format!("{biomass:.2}")),
            maybe(&mut rng, 0.01, format!("{diameter:.2}")),
            maybe(&mut rng, 0.01, format!("{height:.2}")),
            format!("{elevation:.1}"),
            tree_count.to_string(),
            u8::from(burned).to_string(),
            format!("{longitude:.5}"),
            format!("{latitude:.5}"),
        ])?;
    }
    writer.flush()?;

    println!("Wrote {n_plots} plots to {output_path}");
    Ok(())
}
