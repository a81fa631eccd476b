use opref::{Float, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Uniform values in `[0, 1)`.
pub fn random_vec<T: Float>(rng: &mut StdRng, len: usize) -> Vec<T> {
    (0..len).map(|_| T::from_f64(rng.gen::<f64>())).collect()
}

/// Uniform values in `[-1, 1)`.
pub fn random_signed_vec<T: Float>(rng: &mut StdRng, len: usize) -> Vec<T> {
    (0..len)
        .map(|_| T::from_f64(rng.gen::<f64>() * 2.0 - 1.0))
        .collect()
}

pub fn random_tensor<T: Float>(rng: &mut StdRng, dims: &[usize]) -> opref::Result<Tensor<T>> {
    let len = dims.iter().product();
    Tensor::from_vec(dims.to_vec(), random_vec(rng, len))
}
