//! The default 16S analysis: read QC, import, primer trimming, DADA2
//! denoising, classification, filtering, rarefaction, phylogeny and
//! diversity statistics.

use crate::stage::{Checkpoint, Stage};
use amp_types::{Manifest, ProjectPaths, RunConfig};
use itertools::Itertools;
use std::fmt::Write;

const QIIME: &str = "qiime";

fn qiime(name: &'static str, plugin: &str, action: &str) -> Stage {
    Stage::new(name, QIIME).args([plugin, action])
}

/// Build the ordered stage list for one run.
pub fn pipeline_stages(
    config: &RunConfig,
    paths: &ProjectPaths,
    manifest: &Manifest,
) -> Vec<Stage> {
    let threads = config.threads.to_string();
    let depth = config.sampling_depth.to_string();
    let metadata = paths.metadata();
    let art = |name: &str| paths.artifact(name);
    let viz = |name: &str| paths.visualization(name);

    vec![
        Stage::new("fastqc", "fastqc")
            .opt("--outdir", paths.fastqc_dir())
            .opt("--threads", &threads)
            .args(manifest.fastq_files())
            .produces(paths.fastqc_dir()),
        Stage::new("multiqc", "multiqc")
            .arg(paths.fastqc_dir())
            .arg("--force")
            .opt("--outdir", paths.multiqc_dir())
            .produces(paths.multiqc_dir().join("multiqc_report.html"))
            .checkpoint(Checkpoint::AfterQc),
        qiime("import", "tools", "import")
            .opt("--type", "SampleData[PairedEndSequencesWithQuality]")
            .opt("--input-path", paths.manifest())
            .opt("--input-format", "PairedEndFastqManifestPhred33V2")
            .output("--output-path", art("demux.qza")),
        qiime("demux-summary", "demux", "summarize")
            .opt("--i-data", art("demux.qza"))
            .output("--o-visualization", viz("demux.qzv")),
        qiime("trim-primers", "cutadapt", "trim-paired")
            .opt("--i-demultiplexed-sequences", art("demux.qza"))
            .opt("--p-front-f", &config.primer_forward)
            .opt("--p-front-r", &config.primer_reverse)
            .opt("--p-cores", &threads)
            .arg("--p-discard-untrimmed")
            .output("--o-trimmed-sequences", art("trimmed.qza")),
        qiime("trimmed-summary", "demux", "summarize")
            .opt("--i-data", art("trimmed.qza"))
            .output("--o-visualization", viz("trimmed.qzv")),
        qiime("denoise", "dada2", "denoise-paired")
            .opt("--i-demultiplexed-seqs", art("trimmed.qza"))
            .opt("--p-trim-left-f", config.trim_left_forward.to_string())
            .opt("--p-trim-left-r", config.trim_left_reverse.to_string())
            .opt("--p-trunc-len-f", config.trunc_len_forward.to_string())
            .opt("--p-trunc-len-r", config.trunc_len_reverse.to_string())
            .opt("--p-n-threads", &threads)
            .output("--o-table", art("table.qza"))
            .output("--o-representative-sequences", art("rep-seqs.qza"))
            .output("--o-denoising-stats", art("denoising-stats.qza")),
        qiime("denoise-stats", "metadata", "tabulate")
            .opt("--m-input-file", art("denoising-stats.qza"))
            .output("--o-visualization", viz("denoising-stats.qzv"))
            .checkpoint(Checkpoint::AfterDenoise),
        qiime("classify", "feature-classifier", "classify-sklearn")
            .opt("--i-classifier", config.classifier_path(paths.root()))
            .opt("--i-reads", art("rep-seqs.qza"))
            .opt("--p-n-jobs", &threads)
            .output("--o-classification", art("taxonomy.qza")),
        qiime("filter-taxa", "taxa", "filter-table")
            .opt("--i-table", art("table.qza"))
            .opt("--i-taxonomy", art("taxonomy.qza"))
            .opt("--p-exclude", config.exclude_taxa.join(","))
            .output("--o-filtered-table", art("table-filtered.qza")),
        qiime("taxa-barplot", "taxa", "barplot")
            .opt("--i-table", art("table-filtered.qza"))
            .opt("--i-taxonomy", art("taxonomy.qza"))
            .opt("--m-metadata-file", &metadata)
            .output("--o-visualization", viz("taxa-bar-plots.qzv")),
        qiime("rarefy", "feature-table", "rarefy")
            .opt("--i-table", art("table-filtered.qza"))
            .opt("--p-sampling-depth", &depth)
            .output("--o-rarefied-table", art("table-rarefied.qza")),
        qiime("phylogeny", "phylogeny", "align-to-tree-mafft-fasttree")
            .opt("--i-sequences", art("rep-seqs.qza"))
            .opt("--p-n-threads", &threads)
            .output("--o-alignment", art("aligned-rep-seqs.qza"))
            .output("--o-masked-alignment", art("masked-aligned-rep-seqs.qza"))
            .output("--o-tree", art("unrooted-tree.qza"))
            .output("--o-rooted-tree", art("rooted-tree.qza")),
        qiime("core-diversity", "diversity", "core-metrics-phylogenetic")
            .opt("--i-phylogeny", art("rooted-tree.qza"))
            .opt("--i-table", art("table-filtered.qza"))
            .opt("--p-sampling-depth", &depth)
            .opt("--m-metadata-file", &metadata)
            .opt("--p-n-jobs-or-threads", &threads)
            .output("--output-dir", art("core-metrics")),
        qiime("alpha-significance", "diversity", "alpha-group-significance")
            .opt(
                "--i-alpha-diversity",
                art("core-metrics").join("faith_pd_vector.qza"),
            )
            .opt("--m-metadata-file", &metadata)
            .output(
                "--o-visualization",
                viz("faith-pd-group-significance.qzv"),
            ),
        qiime("beta-significance", "diversity", "beta-group-significance")
            .opt(
                "--i-distance-matrix",
                art("core-metrics").join("unweighted_unifrac_distance_matrix.qza"),
            )
            .opt("--m-metadata-file", &metadata)
            .opt("--m-metadata-column", &config.metadata_column)
            .arg("--p-pairwise")
            .output(
                "--o-visualization",
                viz("unweighted-unifrac-group-significance.qzv"),
            ),
    ]
}

/// Human-readable listing of `stages`, numbered from 1, with declared
/// outputs and checkpoints.
pub fn render(stages: &[Stage]) -> String {
    let mut out = String::new();
    for (i, stage) in stages.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, stage.name);
        let _ = writeln!(out, "    $ {}", stage.command_line());
        if !stage.outputs.is_empty() {
            let _ = writeln!(
                out,
                "    -> {}",
                stage.outputs.iter().map(|p| p.display()).join(", ")
            );
        }
        if let Some(checkpoint) = stage.checkpoint {
            let _ = writeln!(out, "    [checkpoint: {checkpoint} if requested]");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use amp_types::Sample;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn fixture() -> (RunConfig, ProjectPaths, Manifest) {
        let manifest = Manifest::new(vec![Sample {
            id: "S1".to_string(),
            forward: "/p/raw_fastq/S1_R1_001.fastq.gz".into(),
            reverse: "/p/raw_fastq/S1_R2_001.fastq.gz".into(),
        }])
        .unwrap();
        (
            RunConfig::default(),
            ProjectPaths::new("/p").unwrap(),
            manifest,
        )
    }

    #[test]
    fn test_stage_order() {
        let (config, paths, manifest) = fixture();
        let names: Vec<_> = pipeline_stages(&config, &paths, &manifest)
            .iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "fastqc",
                "multiqc",
                "import",
                "demux-summary",
                "trim-primers",
                "trimmed-summary",
                "denoise",
                "denoise-stats",
                "classify",
                "filter-taxa",
                "taxa-barplot",
                "rarefy",
                "phylogeny",
                "core-diversity",
                "alpha-significance",
                "beta-significance",
            ]
        );
    }

    #[test]
    fn test_checkpoints_follow_qc_and_denoise_reports() {
        let (config, paths, manifest) = fixture();
        let stages = pipeline_stages(&config, &paths, &manifest);
        let checkpoints: Vec<_> = stages
            .iter()
            .filter_map(|s| s.checkpoint.map(|c| (s.name, c)))
            .collect();
        assert_eq!(
            checkpoints,
            vec![
                ("multiqc", Checkpoint::AfterQc),
                ("denoise-stats", Checkpoint::AfterDenoise)
            ]
        );
    }

    #[test]
    fn test_outputs_feed_later_stages() {
        let (config, paths, manifest) = fixture();
        let stages = pipeline_stages(&config, &paths, &manifest);
        let denoise = stages.iter().find(|s| s.name == "denoise").unwrap();
        assert!(denoise.outputs.contains(&paths.artifact("rep-seqs.qza")));
        let classify = stages.iter().find(|s| s.name == "classify").unwrap();
        assert!(classify
            .args
            .contains(&paths.artifact("rep-seqs.qza").into_os_string()));
    }

    #[test]
    fn test_render_qc_stages() {
        let (config, paths, manifest) = fixture();
        let stages = pipeline_stages(&config, &paths, &manifest);
        assert_snapshot!(render(&stages[..2]).trim_end(), @r"
        1. fastqc
            $ fastqc --outdir /p/results/qc/fastqc --threads 8 /p/raw_fastq/S1_R1_001.fastq.gz /p/raw_fastq/S1_R2_001.fastq.gz
            -> /p/results/qc/fastqc
        2. multiqc
            $ multiqc /p/results/qc/fastqc --force --outdir /p/results/qc/multiqc
            -> /p/results/qc/multiqc/multiqc_report.html
            [checkpoint: stopped after quality control if requested]
        ");
    }
}
