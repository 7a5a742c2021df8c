/// Squared-error loss for the regression head.
pub struct MseLoss;

impl MseLoss {
    /// Mean of `(target - output)²` over the outputs; 0 for no outputs.
    pub fn loss(output: &[f64], target: &[f64]) -> f64 {
        if output.is_empty() {
            return 0.0;
        }
        let sum: f64 = output.iter().zip(target).map(|(o, t)| (t - o) * (t - o)).sum();
        sum / output.len() as f64
    }

    /// `target - output` per neuron, the raw signal the output delta scales.
    pub fn error(output: &[f64], target: &[f64]) -> Vec<f64> {
        output.iter().zip(target).map(|(o, t)| t - o).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_and_error_for_single_target() {
        assert_eq!(MseLoss::loss(&[0.5], &[2.0]), 2.25);
        assert_eq!(MseLoss::loss(&[1.0, 3.0], &[0.0, 1.0]), 2.5);
        assert_eq!(MseLoss::error(&[0.5], &[2.0]), vec![1.5]);
    }

    #[test]
    fn empty_output_has_zero_loss() {
        assert_eq!(MseLoss::loss(&[], &[]), 0.0);
    }
}
