//! Model I/O using the safetensors format.
//!
//! Each linear layer is stored as two F32 tensors named after the VarStore
//! variables, `<layer>.weight` with shape `[outputs, inputs]` and
//! `<layer>.bias` with shape `[outputs]`.

use crate::neural::network::PolicyValueNet;
use crate::{AnalyzerError, Result};
use safetensors::serialize_to_file;
use safetensors::tensor::{Dtype, SafeTensors, TensorView};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tch::Tensor;

fn model_err(e: impl std::fmt::Display) -> AnalyzerError {
    AnalyzerError::Model(e.to_string())
}

fn to_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn from_bytes(view: &TensorView, name: &str, expected_shape: &[usize]) -> Result<Vec<f32>> {
    if view.dtype() != Dtype::F32 {
        return Err(model_err(format!("tensor '{}' has dtype {:?}, expected F32", name, view.dtype())));
    }
    if view.shape() != expected_shape {
        return Err(model_err(format!(
            "tensor '{}' has shape {:?}, expected {:?}",
            name,
            view.shape(),
            expected_shape
        )));
    }
    Ok(view
        .data()
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Save network weights to a safetensors file
pub fn save_weights(net: &PolicyValueNet, path: impl AsRef<Path>) -> Result<()> {
    let parameters = net.parameters()?;
    let buffers: Vec<(String, Vec<usize>, Vec<u8>)> = parameters
        .into_iter()
        .map(|p| (p.name, p.shape, to_bytes(&p.values)))
        .collect();

    let mut views: HashMap<String, TensorView<'_>> = HashMap::new();
    for (name, shape, data) in &buffers {
        let view = TensorView::new(Dtype::F32, shape.clone(), data).map_err(model_err)?;
        views.insert(name.clone(), view);
    }

    serialize_to_file(views, &None, path.as_ref()).map_err(model_err)?;
    log::info!("💾 Saved {} parameters to {}", net.num_parameters(), path.as_ref().display());
    Ok(())
}

/// Load network weights from a safetensors file. Every VarStore variable must
/// be present with its expected shape.
pub fn load_weights(path: impl AsRef<Path>) -> Result<PolicyValueNet> {
    let mut file = File::open(path.as_ref())?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    let tensors = SafeTensors::deserialize(&buffer).map_err(model_err)?;
    let net = PolicyValueNet::zeros();
    for (name, mut var) in net.var_store().variables() {
        let shape: Vec<usize> = var.size().iter().map(|&d| d as usize).collect();
        let view = tensors
            .tensor(&name)
            .map_err(|_| model_err(format!("tensor '{}' not found", name)))?;
        let values = from_bytes(&view, &name, &shape)?;
        let loaded = Tensor::from_slice(&values).reshape(var.size().as_slice());
        tch::no_grad(|| var.copy_(&loaded));
    }
    log::info!("📂 Loaded {} parameters from {}", net.num_parameters(), path.as_ref().display());
    Ok(net)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::features::FEATURE_SIZE;
    use assert_matches::assert_matches;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.safetensors");
        let net = PolicyValueNet::new_seeded(42);
        save_weights(&net, &path).unwrap();
        let loaded = load_weights(&path).unwrap();
        assert_eq!(net.parameters().unwrap(), loaded.parameters().unwrap());

        let features = vec![0.25; FEATURE_SIZE];
        assert_eq!(net.forward(&features).unwrap(), loaded.forward(&features).unwrap());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_weights(dir.path().join("missing.safetensors"));
        assert_matches!(result, Err(AnalyzerError::Io(_)));
    }

    #[test]
    fn test_garbage_file_is_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.safetensors");
        std::fs::write(&path, b"not a safetensors file").unwrap();
        assert_matches!(load_weights(&path), Err(AnalyzerError::Model(_)));
    }

    #[test]
    fn test_missing_tensor_is_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.safetensors");
        let bias = to_bytes(&[0.0; 4]);
        let mut views = HashMap::new();
        views.insert(
            "value_head.bias".to_string(),
            TensorView::new(Dtype::F32, vec![4], &bias).unwrap(),
        );
        serialize_to_file(views, &None, &path).unwrap();
        assert_matches!(load_weights(&path), Err(AnalyzerError::Model(_)));
    }
}
