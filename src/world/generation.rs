use rand::prelude::*;

use crate::config::generation::GridParams;
use crate::world::Grid;

/// 32-bit linear congruential generator used for deposit placement.
///
/// Output is fixed by the seed alone, so saves only need the seed to rebuild
/// the deposit layout.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        // Only the low 32 bits seed the sequence.
        Lcg { state: seed as u32 }
    }

    /// Next value in `[0, 1]`.
    pub fn next_unit(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        self.state as f64 / u32::MAX as f64
    }
}

/// Deposit flags for a `width` x `height` grid, row-major.
pub fn deposit_layout(width: u32, height: u32, seed: u64, chance: f64) -> Vec<bool> {
    let mut lcg = Lcg::new(seed);
    (0..width as usize * height as usize)
        .map(|_| lcg.next_unit() < chance)
        .collect()
}

/// Pick a concrete seed: 0 means random.
pub fn resolve_seed(seed: u64) -> u64 {
    if seed == 0 {
        // Keep the seed inside the 32 bits the generator uses, and non-zero.
        (rand::thread_rng().r#gen::<u32>() as u64).max(1)
    } else {
        seed
    }
}

/// Generate a grid from the given parameters.
///
/// If `params.seed` is 0 a random seed is chosen. The seed actually used is
/// stored in the returned grid's params.
pub fn generate_grid(params: &GridParams) -> Grid {
    let resolved = GridParams {
        seed: resolve_seed(params.seed),
        ..params.clone()
    };
    Grid::generate(resolved)
}

/// Print a summary of a grid.
pub fn print_grid_summary(grid: &Grid) {
    let params = grid.params();
    println!("=== Grid Summary ===");
    println!("Size: {} x {}", params.width, params.height);
    println!("Seed: {}", params.seed);
    let deposits = grid.deposit_count();
    let total = params.width as usize * params.height as usize;
    println!(
        "Deposits: {} ({:.2}%)",
        deposits,
        deposits as f64 / total as f64 * 100.0
    );
    println!("Modules built: {}", grid.module_tiles().count());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcg_matches_known_sequence() {
        let mut lcg = Lcg::new(1);
        // 1103515245 * 1 + 12345
        let first = 1_103_527_590u32;
        assert_eq!(lcg.next_unit(), first as f64 / u32::MAX as f64);
        let second = first.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        assert_eq!(lcg.next_unit(), second as f64 / u32::MAX as f64);
    }

    #[test]
    fn seed_uses_low_32_bits() {
        let a = deposit_layout(50, 40, 7, 0.1);
        let b = deposit_layout(50, 40, 7 + (1u64 << 32), 0.1);
        assert_eq!(a, b);
    }

    #[test]
    fn same_seed_same_layout() {
        let a = deposit_layout(200, 150, 42, 0.02);
        let b = deposit_layout(200, 150, 42, 0.02);
        assert_eq!(a, b);
        assert_ne!(a, deposit_layout(200, 150, 43, 0.02));
    }

    #[test]
    fn deposit_density_is_roughly_the_chance() {
        let layout = deposit_layout(200, 150, 12345, 0.02);
        let count = layout.iter().filter(|&&d| d).count();
        let pct = count as f64 / layout.len() as f64;
        assert!(
            pct > 0.01 && pct < 0.03,
            "Expected ~2% deposits, got {:.2}% ({} of {})",
            pct * 100.0,
            count,
            layout.len()
        );
    }

    #[test]
    fn zero_and_full_chance() {
        assert!(deposit_layout(20, 20, 9, 0.0).iter().all(|&d| !d));
        assert!(deposit_layout(20, 20, 9, 1.0).iter().all(|&d| d));
    }

    #[test]
    fn random_seed_is_resolved_and_recorded() {
        let grid = generate_grid(&GridParams::default());
        let seed = grid.params().seed;
        assert_ne!(seed, 0);
        let again = generate_grid(&GridParams::with_seed(seed));
        assert_eq!(grid, again);
    }
}
