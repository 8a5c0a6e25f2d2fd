use log::debug;

use crate::error::{PointCloudError, Result};
use crate::params::{Param, Params};
use crate::point_cloud::Coordinate;

/// key of the worker count in a parameter dictionary
pub const CORES_KEY: &str = "cores";
/// key of the numerical tolerance in a parameter dictionary
pub const EPS_KEY: &str = "eps";

/// Settings shared by the simplification algorithms
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimpParams<T> {
    cores: usize,
    eps: T,
}

impl<T: Coordinate> Default for SimpParams<T> {
    fn default() -> Self {
        Self {
            cores: 1,
            eps: T::epsilon(),
        }
    }
}

impl<T: Coordinate> SimpParams<T> {
    pub fn new(cores: usize, eps: T) -> Result<Self> {
        if cores == 0 {
            return Err(PointCloudError::InvalidParameter {
                name: CORES_KEY.to_string(),
                reason: "at least one core is required".to_string(),
            });
        }
        if !eps.is_finite() || eps < T::zero() {
            return Err(PointCloudError::InvalidParameter {
                name: EPS_KEY.to_string(),
                reason: "tolerance must be finite and non-negative".to_string(),
            });
        }
        Ok(Self { cores, eps })
    }

    /// `cores` workers with the default tolerance
    pub fn with_cores(cores: usize) -> Result<Self> {
        Self::new(cores, T::epsilon())
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    pub fn eps(&self) -> T {
        self.eps
    }

    /// Thread pool sized to `cores`, for algorithms to run their parallel sections in.
    pub fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.cores)
            .build()?;
        Ok(pool)
    }
}

impl<T: Coordinate + Param> SimpParams<T> {
    /// Reads `cores` and `eps`, falling back to the defaults for absent keys.
    pub fn from_params(params: &Params) -> Result<Self> {
        let defaults = Self::default();
        let cores = params.get_or(CORES_KEY, defaults.cores)?;
        let eps = params.get_or(EPS_KEY, defaults.eps)?;
        debug!("simplification parameters: cores={}, eps={:?}", cores, eps);
        Self::new(cores, eps)
    }

    pub fn to_params(&self) -> Params {
        Params::new()
            .with(CORES_KEY, self.cores)
            .with(EPS_KEY, self.eps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = SimpParams::<f64>::default();
        assert_eq!(p.cores(), 1);
        assert_eq!(p.eps(), f64::EPSILON);

        let p = SimpParams::<f32>::default();
        assert_eq!(p.eps(), f32::EPSILON);
    }

    #[test]
    fn preserves_cores() {
        let p = SimpParams::<f64>::with_cores(4).unwrap();
        let copy = p;
        assert_eq!(p.cores(), 4);
        assert_eq!(copy.cores(), 4);
        assert_eq!(p.eps(), f64::EPSILON);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            SimpParams::<f64>::with_cores(0),
            Err(PointCloudError::InvalidParameter { .. })
        ));
        assert!(SimpParams::new(1, -1.0_f64).is_err());
        assert!(SimpParams::new(1, f32::NAN).is_err());
    }

    #[test]
    fn read_from_dictionary() {
        let p = SimpParams::<f64>::from_params(&Params::new()).unwrap();
        assert_eq!(p, SimpParams::default());

        let params = Params::new().with(CORES_KEY, 3_usize).with(EPS_KEY, 1e-4_f64);
        let p = SimpParams::<f64>::from_params(&params).unwrap();
        assert_eq!((p.cores(), p.eps()), (3, 1e-4));
        assert_eq!(p.to_params(), params);

        // stored as f64, requested as f32
        assert!(matches!(
            SimpParams::<f32>::from_params(&params),
            Err(PointCloudError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn pool_size() {
        let pool = SimpParams::<f64>::with_cores(2).unwrap().thread_pool().unwrap();
        assert_eq!(pool.current_num_threads(), 2);
    }
}
