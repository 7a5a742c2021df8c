//! Versioned model file: one line with the model version, one with the
//! normalization tag, one with its two parameters, then the network in the
//! text format of [`crate::network::persist`].

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::{
    error::{NetError, Result},
    network::{network::Network, persist::Tokens},
    normalization::normalizer::{NormalizationKind, NormalizationState},
};

/// Everything a model file restores.
#[derive(Debug, Clone)]
pub struct ModelFile {
    pub version: String,
    pub normalization: NormalizationState,
    pub network: Network,
}

pub fn write_model<W: Write>(
    writer: &mut W,
    version: &str,
    normalization: &NormalizationState,
    network: &Network,
) -> Result<()> {
    let (a, b) = normalization.params();
    writeln!(writer, "{}", version)?;
    writeln!(writer, "{}", normalization.kind().tag())?;
    writeln!(writer, "{} {}", a, b)?;
    network.save(writer)
}

pub fn read_model<R: Read>(reader: &mut R) -> Result<ModelFile> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    let (version, rest) = text
        .split_once('\n')
        .ok_or_else(|| NetError::Format("model file has no version line".to_string()))?;
    let version = version.trim_end_matches('\r');

    let mut tokens = Tokens::new(rest);
    let kind = NormalizationKind::from_tag(tokens.expect("normalization tag")?)?;
    let a = tokens.expect("normalization parameter")?;
    let b = tokens.expect("normalization parameter")?;
    let network = Network::from_tokens(&mut tokens)?;

    Ok(ModelFile {
        version: version.to_string(),
        normalization: NormalizationState::from_params(kind, a, b),
        network,
    })
}

pub fn save_model_file<P: AsRef<Path>>(
    path: P,
    version: &str,
    normalization: &NormalizationState,
    network: &Network,
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_model(&mut writer, version, normalization, network)?;
    writer.flush()?;
    Ok(())
}

pub fn load_model_file<P: AsRef<Path>>(path: P) -> Result<ModelFile> {
    let mut file = File::open(path)?;
    read_model(&mut file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::layers::Layer;

    fn network() -> Network {
        let mut network = Network::new(4, 1);
        network
            .push_layer(Layer::with_params(vec![vec![1.0, 0.5, 0.0, -2.0]], vec![0.5], ActivationFunction::Sigmoid).unwrap())
            .unwrap();
        network
    }

    #[test]
    fn writes_version_and_normalization_before_network() {
        let mut buf = Vec::new();
        let state = NormalizationState::ZScore { mean: 3.0, std: 1.5 };
        write_model(&mut buf, "2.1", &state, &network()).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "2.1\n1\n3 1.5\n4 1\n4 1 1\n1 0.5 0 -2\n0.5\n"
        );
    }

    #[test]
    fn read_restores_every_part() {
        let text = "model v3\n0\n-1 1\n4 1\n4 1 1\n1 0.5 0 -2\n0.5\n";
        let file = read_model(&mut text.as_bytes()).unwrap();
        assert_eq!(file.version, "model v3");
        assert_eq!(file.normalization, NormalizationState::MinMax { min_range: -1.0, max_range: 1.0 });
        assert_eq!(file.network.layers().len(), 1);
        assert_eq!(file.network.layers()[0].activation(), ActivationFunction::Sigmoid);
    }

    #[test]
    fn empty_version_survives_a_round_trip() {
        let mut buf = Vec::new();
        let state = NormalizationState::MinMax { min_range: 0.0, max_range: 1.0 };
        write_model(&mut buf, "", &state, &Network::new(4, 1)).unwrap();

        let file = read_model(&mut buf.as_slice()).unwrap();
        assert_eq!(file.version, "");
        assert_eq!(file.normalization, state);
        assert!(file.network.is_empty());
    }

    #[test]
    fn bad_normalization_tag_is_a_config_error() {
        let text = "1.0\n7\n0 1\n4 1\n";
        assert!(matches!(read_model(&mut text.as_bytes()), Err(NetError::Config(_))));
    }

    #[test]
    fn empty_file_is_a_format_error() {
        assert!(matches!(read_model(&mut "".as_bytes()), Err(NetError::Format(_))));
        assert!(matches!(read_model(&mut "1.0\n0\n".as_bytes()), Err(NetError::Format(_))));
    }
}
