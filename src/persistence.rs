//! Model serialization and persistence
//!
//! Trained binary and one-vs-one models are written as JSON together with
//! their kernel parameters, so a loaded model predicts through
//! [`KernelType`] without knowing the original kernel type. Models over a
//! closure kernel have no serializable description and are rejected.

use crate::api::TrainedModel;
use crate::core::{Error, OptimizerConfig, Result, SVMModel, Sample, SolverStatus, SparseVector};
use crate::kernel::{Kernel, KernelType};
use crate::multiclass::MulticlassModel;
use crate::optimizer::TrainedSVM;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Bumped whenever the on-disk layout changes
pub const FORMAT_VERSION: u32 = 1;

/// Serializable representation of a trained SVM model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableModel {
    pub format_version: u32,
    pub kernel: KernelType,
    /// Distinct labels in ascending order
    pub classes: Vec<i32>,
    /// One machine for a binary model, one per class pair otherwise
    pub machines: Vec<SerializableMachine>,
    pub metadata: ModelMetadata,
}

/// One binary decision function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableMachine {
    /// `[negative, positive]` labels
    pub classes: [i32; 2],
    pub bias: f64,
    pub status: SolverStatus,
    pub iterations: usize,
    pub support_vectors: Vec<SerializableSample>,
    /// Multipliers aligned with `support_vectors`
    pub alpha: Vec<f64>,
}

/// Serializable sample representation
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SerializableSample {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
    /// ±1
    pub label: f64,
}

/// Model metadata for tracking and validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    pub n_support_vectors: usize,
    /// Solver configuration, when the caller recorded it
    pub training_params: Option<OptimizerConfig>,
    pub created_at: DateTime<Utc>,
}

impl From<&Sample> for SerializableSample {
    fn from(sample: &Sample) -> Self {
        Self {
            indices: sample.features.indices.clone(),
            values: sample.features.values.clone(),
            label: sample.label,
        }
    }
}

impl TryFrom<&SerializableSample> for Sample {
    type Error = Error;

    fn try_from(s: &SerializableSample) -> Result<Self> {
        if s.indices.len() != s.values.len() {
            return Err(Error::SerializationError(format!(
                "support vector has {} indices but {} values",
                s.indices.len(),
                s.values.len()
            )));
        }
        if s.label != 1.0 && s.label != -1.0 {
            return Err(Error::InvalidLabel(s.label));
        }
        Ok(Sample::new(
            SparseVector::new(s.indices.clone(), s.values.clone()),
            s.label,
        ))
    }
}

fn kernel_description<K: Kernel>(kernel: &K) -> Result<KernelType> {
    kernel.kernel_type().ok_or_else(|| {
        Error::UnsupportedConfiguration(
            "custom kernels cannot be persisted; use a built-in kernel".to_string(),
        )
    })
}

fn machine_from<K: Kernel>(svm: &TrainedSVM<K>, classes: [i32; 2]) -> SerializableMachine {
    SerializableMachine {
        classes,
        bias: svm.bias(),
        status: svm.status(),
        iterations: svm.iterations(),
        support_vectors: svm
            .support_vectors()
            .iter()
            .map(SerializableSample::from)
            .collect(),
        alpha: svm.alpha_values().to_vec(),
    }
}

impl SerializableMachine {
    fn into_model(self, kernel: Arc<KernelType>) -> Result<TrainedModel<KernelType>> {
        if self.alpha.len() != self.support_vectors.len() {
            return Err(Error::SerializationError(format!(
                "{} multipliers for {} support vectors",
                self.alpha.len(),
                self.support_vectors.len()
            )));
        }
        let support_vectors = self
            .support_vectors
            .iter()
            .map(Sample::try_from)
            .collect::<Result<Vec<_>>>()?;

        let svm = TrainedSVM::from_parts(
            kernel,
            support_vectors,
            self.alpha,
            self.bias,
            self.status,
            self.iterations,
        );
        Ok(TrainedModel::new(svm, self.classes))
    }
}

impl SerializableModel {
    /// Describe a trained binary model
    pub fn from_trained_model<K: Kernel>(model: &TrainedModel<K>) -> Result<Self> {
        let kernel = kernel_description(model.inner().kernel())?;
        let machines = vec![machine_from(model.inner(), model.classes())];
        Ok(Self::assemble(kernel, model.classes().to_vec(), machines))
    }

    /// Describe a trained one-vs-one model
    pub fn from_multiclass<K: Kernel>(model: &MulticlassModel<K>) -> Result<Self> {
        let first = model
            .machines()
            .first()
            .ok_or_else(|| Error::SerializationError("model has no machines".to_string()))?;
        let kernel = kernel_description(first.inner().kernel())?;
        let machines = model
            .machines()
            .iter()
            .map(|m| machine_from(m.inner(), m.classes()))
            .collect();
        Ok(Self::assemble(kernel, model.classes().to_vec(), machines))
    }

    fn assemble(kernel: KernelType, classes: Vec<i32>, machines: Vec<SerializableMachine>) -> Self {
        let n_support_vectors = machines.iter().map(|m| m.support_vectors.len()).sum();
        Self {
            format_version: FORMAT_VERSION,
            kernel,
            classes,
            machines,
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                n_support_vectors,
                training_params: None,
                created_at: Utc::now(),
            },
        }
    }

    /// Record the solver configuration used for training
    pub fn with_training_params(mut self, config: OptimizerConfig) -> Self {
        self.metadata.training_params = Some(config);
        self
    }

    pub fn is_multiclass(&self) -> bool {
        self.classes.len() > 2
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.to_writer(BufWriter::new(file))
    }

    pub fn to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| Error::SerializationError(e.to_string()))?;
        writer.flush()?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let model: Self = serde_json::from_reader(reader)
            .map_err(|e| Error::SerializationError(e.to_string()))?;
        if model.format_version != FORMAT_VERSION {
            return Err(Error::SerializationError(format!(
                "unsupported model format version {} (expected {FORMAT_VERSION})",
                model.format_version
            )));
        }
        Ok(model)
    }

    /// Rebuild a binary model
    pub fn to_trained_model(&self) -> Result<TrainedModel<KernelType>> {
        match self.machines.as_slice() {
            [machine] => machine.clone().into_model(Arc::new(self.kernel)),
            machines => Err(Error::UnsupportedConfiguration(format!(
                "expected a binary model, found {} machines",
                machines.len()
            ))),
        }
    }

    /// Rebuild a one-vs-one model; a binary file yields a single machine
    pub fn to_multiclass(&self) -> Result<MulticlassModel<KernelType>> {
        let expected = self.classes.len() * self.classes.len().saturating_sub(1) / 2;
        if self.classes.len() < 2 || self.machines.len() != expected {
            return Err(Error::SerializationError(format!(
                "{} classes need {expected} machines, found {}",
                self.classes.len(),
                self.machines.len()
            )));
        }
        let kernel = Arc::new(self.kernel);
        let machines = self
            .machines
            .iter()
            .map(|m| m.clone().into_model(Arc::clone(&kernel)))
            .collect::<Result<Vec<_>>>()?;
        Ok(MulticlassModel::from_parts(self.classes.clone(), machines))
    }

    /// Human-readable description
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "=== SVM Model Summary ===".to_string(),
            format!("Kernel: {}", self.kernel),
            format!("Classes: {:?}", self.classes),
            format!("Machines: {}", self.machines.len()),
            format!("Support Vectors: {}", self.metadata.n_support_vectors),
        ];
        if let [machine] = self.machines.as_slice() {
            lines.push(format!("Bias: {:.6}", machine.bias));
            lines.push(format!("Status: {:?}", machine.status));
        }
        lines.push(format!("Library Version: {}", self.metadata.library_version));
        lines.push(format!("Created: {}", self.metadata.created_at.to_rfc3339()));
        if let Some(params) = &self.metadata.training_params {
            lines.push("Training Parameters:".to_string());
            lines.push(format!("  C: {}", params.c));
            lines.push(format!("  Epsilon: {}", params.epsilon));
            lines.push(format!("  Max Iterations: {}", params.max_iterations));
            lines.push(format!(
                "  Working Set: {:?}",
                params.working_set_strategy
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SVM;
    use crate::kernel::{CustomKernel, LinearKernel, RBFKernel};
    use crate::multiclass::MulticlassSVM;
    use tempfile::NamedTempFile;

    fn toy() -> (Vec<SparseVector>, Vec<i32>) {
        let inputs = [[2.0, 1.0], [3.0, 2.5], [-1.0, -2.0], [-2.5, -0.5]]
            .iter()
            .map(|x| SparseVector::from_dense(x))
            .collect();
        (inputs, vec![1, 1, -1, -1])
    }

    #[test]
    fn test_serializable_sample_conversion() {
        let sample = Sample::new(SparseVector::new(vec![0, 2, 5], vec![1.0, 2.0, 3.0]), 1.0);

        let serializable = SerializableSample::from(&sample);
        assert_eq!(serializable.indices, vec![0, 2, 5]);

        let converted_back = Sample::try_from(&serializable).unwrap();
        assert_eq!(converted_back.features, sample.features);
        assert_eq!(converted_back.label, sample.label);

        let bad = SerializableSample {
            label: 3.0,
            ..serializable
        };
        assert!(matches!(Sample::try_from(&bad), Err(Error::InvalidLabel(_))));
    }

    #[test]
    fn test_binary_model_round_trip() -> Result<()> {
        let (inputs, labels) = toy();
        let config = OptimizerConfig {
            c: 2.0,
            ..Default::default()
        };
        let model = SVM::with_kernel(RBFKernel::new(0.3))
            .with_config(config.clone())
            .learn(&inputs, &labels, None)?;
        let serializable = SerializableModel::from_trained_model(&model)?.with_training_params(config);

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        serializable.save_to_file(temp_file.path())?;
        let loaded = SerializableModel::load_from_file(temp_file.path())?;

        assert_eq!(loaded.kernel, KernelType::Rbf { gamma: 0.3 });
        assert!(!loaded.is_multiclass());
        assert_eq!(loaded.metadata.training_params.as_ref().map(|p| p.c), Some(2.0));

        let restored = loaded.to_trained_model()?;
        let queries = [
            SparseVector::from_dense(&[0.5, 0.5]),
            SparseVector::from_dense(&[-3.0, 1.0]),
        ];
        for x in inputs.iter().chain(queries.iter()) {
            assert_eq!(restored.decide(x), model.decide(x));
            assert!((restored.score(x) - model.score(x)).abs() < 1e-12);
        }
        assert!(loaded.summary().contains("rbf(gamma=0.3)"));
        Ok(())
    }

    #[test]
    fn test_loaded_linear_model_compacts() -> Result<()> {
        let (inputs, labels) = toy();
        let model = SVM::with_kernel(LinearKernel::new()).learn(&inputs, &labels, None)?;

        let mut buffer = Vec::new();
        SerializableModel::from_trained_model(&model)?.to_writer(&mut buffer)?;
        let loaded = SerializableModel::from_reader(buffer.as_slice())?.to_trained_model()?;

        let compact = loaded.compact().expect("linear kernel compacts");
        let original = model.compact();
        assert_eq!(compact.weights().len(), original.weights().len());
        for (w, v) in compact.weights().iter().zip(original.weights()) {
            assert!((w - v).abs() < 1e-12);
        }
        assert!((compact.bias() - original.bias()).abs() < 1e-12);
        for x in &inputs {
            assert!((compact.score(x) - loaded.score(x)).abs() < 1e-12);
        }

        let rbf = SVM::with_kernel(RBFKernel::new(0.3)).learn(&inputs, &labels, None)?;
        let mut buffer = Vec::new();
        SerializableModel::from_trained_model(&rbf)?.to_writer(&mut buffer)?;
        let loaded = SerializableModel::from_reader(buffer.as_slice())?.to_trained_model()?;
        assert!(loaded.compact().is_none());
        Ok(())
    }

    #[test]
    fn test_multiclass_round_trip() -> Result<()> {
        let inputs: Vec<SparseVector> = [[0.0, 0.0], [0.3, 0.1], [4.0, 0.0], [4.2, 0.3], [0.0, 4.0], [0.2, 4.1]]
            .iter()
            .map(|x| SparseVector::from_dense(x))
            .collect();
        let labels = [0, 0, 1, 1, 2, 2];
        let model = MulticlassSVM::new().learn(&inputs, &labels, None)?;

        let mut buffer = Vec::new();
        SerializableModel::from_multiclass(&model)?.to_writer(&mut buffer)?;
        let loaded = SerializableModel::from_reader(buffer.as_slice())?;

        assert!(loaded.is_multiclass());
        assert!(matches!(
            loaded.to_trained_model(),
            Err(Error::UnsupportedConfiguration(_))
        ));
        let restored = loaded.to_multiclass()?;
        for x in &inputs {
            assert_eq!(restored.decide(x), model.decide(x));
        }
        Ok(())
    }

    #[test]
    fn test_custom_kernel_rejected() {
        let (inputs, labels) = toy();
        let kernel = CustomKernel::new(|x: &SparseVector, y: &SparseVector| x.dot(y));
        let model = SVM::with_kernel(kernel).learn(&inputs, &labels, None).unwrap();

        assert!(matches!(
            SerializableModel::from_trained_model(&model),
            Err(Error::UnsupportedConfiguration(_))
        ));
    }

    #[test]
    fn test_corrupt_files_rejected() {
        assert!(matches!(
            SerializableModel::from_reader("not json".as_bytes()),
            Err(Error::SerializationError(_))
        ));
        assert!(matches!(
            SerializableModel::load_from_file("/non/existent/model.json"),
            Err(Error::IoError(_))
        ));

        let (inputs, labels) = toy();
        let model = SVM::new().learn(&inputs, &labels, None).unwrap();
        let mut serializable = SerializableModel::from_trained_model(&model).unwrap();
        serializable.machines[0].alpha.pop();
        assert!(matches!(
            serializable.to_trained_model(),
            Err(Error::SerializationError(_))
        ));

        serializable.format_version = 99;
        let mut buffer = Vec::new();
        serializable.to_writer(&mut buffer).unwrap();
        assert!(matches!(
            SerializableModel::from_reader(buffer.as_slice()),
            Err(Error::SerializationError(msg)) if msg.contains("99")
        ));
    }
}
