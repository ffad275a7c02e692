//! End-to-end tests for the normalize -> merge -> vcf pipelines

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use varmerge::{
    filter_by_gene, read_csv, read_vep, vcf, write_table_to_path, AnnotationNormalizer,
    AnnotationSchema, OutputFormat, UnmatchedLog, VariantMatcher,
};

const VEP_OUTPUT: &str = "\
## ENSEMBL VARIANT EFFECT PREDICTOR v110.1
## Extra column keys:
## SYMBOL : Gene symbol (e.g. HGNC)
#Uploaded_variation\tLocation\tAllele\tGene\tFeature\tFeature_type\tConsequence\tcDNA_position\tCDS_position\tProtein_position\tAmino_acids\tCodons\tExisting_variation\tExtra
v1\t17:43057062\tT\tENSG00000012048\tENST00000357654\tTranscript\tmissense_variant\t5266\t5147\t1716\tR/C\tCgc/Tgc\trs80357906\tSYMBOL=BRCA1;SIFT=deleterious(0.01);PolyPhen=probably_damaging(0.998);VEST4_score=0.5,.,0.8;REVEL=0.7
v2\t17:43106487\tG\tENSG00000012048\tENST00000357654\tTranscript\tmissense_variant\t181\t62\t21\tT/A\tAcc/Gcc\trs28897672\tSYMBOL=BRCA1;SIFT=tolerated(0.3)
v3\t17:43045712\tA\tENSG00000012048\tENST00000471181\tTranscript\tmissense_variant\t5400\t5281\t1761\tG/S\tGgc/Agc\trs41293463\tSYMBOL=BRCA1
";

const CLINICAL_CSV: &str = "\
GeneSymbol,Feature,Existing_variation,Codons,ClinicalSignificance,Chromosome,PositionVCF,ReferenceAlleleVCF,AlternateAlleleVCF
BRCA1,ENST00000357654,rs80357906,Cgc/Tgc,Pathogenic,17,43057062,C,T
TP53,ENST00000269305,rs28934578,Cgc/Cac,Pathogenic,17,7675088,C,T
BRCA1,ENST00000999999,rs1000000,Aaa/Gaa,Uncertain significance,17,43000000,A,G
BRCA1,ENST00000471181,rs41293463,Ggc/Agc,Benign,17,43045712,G,A
";

struct Workspace {
    _dir: TempDir,
    clinvar: std::path::PathBuf,
    vep_raw: std::path::PathBuf,
    vep_normalized: std::path::PathBuf,
    merged: std::path::PathBuf,
    log: std::path::PathBuf,
}

fn workspace() -> Workspace {
    let dir = TempDir::new().unwrap();
    let clinvar = dir.path().join("clinvar.csv");
    let vep_raw = dir.path().join("vep.txt");
    fs::write(&clinvar, CLINICAL_CSV).unwrap();
    fs::write(&vep_raw, VEP_OUTPUT).unwrap();

    Workspace {
        vep_normalized: dir.path().join("vep_normalized.csv"),
        merged: dir.path().join("merged.csv"),
        log: dir.path().join("unmatched.log"),
        clinvar,
        vep_raw,
        _dir: dir,
    }
}

fn normalize(raw: &Path, output: &Path) {
    let normalizer = AnnotationNormalizer::new(AnnotationSchema::default()).unwrap();
    let table = read_vep(raw).unwrap();
    let normalized = normalizer.normalize(&table).unwrap();
    write_table_to_path(&normalized, OutputFormat::Csv, output).unwrap();
}

fn merge(ws: &Workspace, gene: &str) -> varmerge::MatchReport {
    let clinical = filter_by_gene(&read_csv(&ws.clinvar).unwrap(), gene).unwrap();
    let annotations = read_csv(&ws.vep_normalized).unwrap();
    let mut log = UnmatchedLog::create(&ws.log).unwrap();

    VariantMatcher::new()
        .run(&clinical, &annotations, &mut log)
        .unwrap()
}

#[test]
fn test_normalized_table_layout() {
    let ws = workspace();
    normalize(&ws.vep_raw, &ws.vep_normalized);

    let table = read_csv(&ws.vep_normalized).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.columns(), AnnotationSchema::default().columns.as_slice());

    let first = &table.rows()[0];
    assert_eq!(first.get("GeneSymbol"), Some("BRCA1"));
    assert_eq!(first.get("SIFT_label"), Some("deleterious"));
    assert_eq!(first.get("SIFT_score"), Some("0.01"));
    assert_eq!(first.get("PolyPhen_label"), Some("probably_damaging"));
    assert_eq!(first.get("PolyPhen_score"), Some("0.998"));
    assert_eq!(first.get("VEST4_score"), Some("0.8"));
    assert_eq!(first.get("REVEL_score"), Some("0.7"));
    assert_eq!(first.get("AM_label"), Some("NA"));

    let third = &table.rows()[2];
    assert_eq!(third.get("SIFT_label"), Some("NA"));
    assert_eq!(third.get("VEST4_score"), Some("0"));
}

#[test]
fn test_merge_end_to_end() {
    let ws = workspace();
    normalize(&ws.vep_raw, &ws.vep_normalized);

    let report = merge(&ws, "BRCA1");
    write_table_to_path(&report.merged, OutputFormat::Csv, &ws.merged).unwrap();

    assert_eq!(report.stats.processed, 3);
    assert_eq!(report.stats.matched, 2);
    assert_eq!(report.stats.unmatched, 1);
    assert_eq!(report.unmatched, vec![2]);

    let merged = read_csv(&ws.merged).unwrap();
    assert_eq!(merged.len(), 2);

    // clinical columns first, then the annotation-only ones
    assert_eq!(merged.columns()[0], "GeneSymbol");
    assert_eq!(merged.columns()[4], "ClinicalSignificance");
    assert!(merged.has_column("SIFT_label"));

    let first = &merged.rows()[0];
    assert_eq!(first.get("ClinicalSignificance"), Some("Pathogenic"));
    assert_eq!(first.get("SIFT_label"), Some("deleterious"));
    assert_eq!(first.get("Codons"), Some("Cgc/Tgc"));

    let second = &merged.rows()[1];
    assert_eq!(second.get("ClinicalSignificance"), Some("Benign"));
    assert_eq!(second.get("Location"), Some("17:43045712"));
}

#[test]
fn test_every_record_merged_or_logged() {
    let ws = workspace();
    normalize(&ws.vep_raw, &ws.vep_normalized);

    let report = merge(&ws, "BRCA1");

    assert_eq!(
        report.merged.len() + report.unmatched.len(),
        report.stats.processed
    );
}

#[test]
fn test_unmatched_log_contents() {
    let ws = workspace();
    normalize(&ws.vep_raw, &ws.vep_normalized);

    merge(&ws, "BRCA1");

    let log = fs::read_to_string(&ws.log).unwrap();
    assert_eq!(
        log,
        "Unmatched Variants Log\nVariant in row 2 could not be merged\n"
    );
}

#[test]
fn test_annotation_values_win_on_shared_columns() {
    let ws = workspace();
    fs::write(
        &ws.clinvar,
        "GeneSymbol,Feature,Existing_variation,Codons,Location\n\
         BRCA1,ENST00000471181,rs41293463,Ggc/Agc,clinical-location\n",
    )
    .unwrap();
    normalize(&ws.vep_raw, &ws.vep_normalized);

    let report = merge(&ws, "BRCA1");

    assert_eq!(report.merged.len(), 1);
    assert_eq!(
        report.merged.rows()[0].get("Location"),
        Some("17:43045712")
    );
    // shared column keeps its clinical position
    assert_eq!(report.merged.columns()[4], "Location");
}

#[test]
fn test_unknown_gene_gives_empty_outputs() {
    let ws = workspace();
    normalize(&ws.vep_raw, &ws.vep_normalized);

    let report = merge(&ws, "NOTAGENE");
    write_table_to_path(&report.merged, OutputFormat::Csv, &ws.merged).unwrap();

    assert_eq!(report.stats.processed, 0);

    let merged = fs::read_to_string(&ws.merged).unwrap();
    assert_eq!(merged.lines().count(), 1);
    assert_eq!(
        fs::read_to_string(&ws.log).unwrap(),
        "Unmatched Variants Log\n"
    );
}

#[test]
fn test_vcf_for_gene() {
    let ws = workspace();
    let clinical = filter_by_gene(&read_csv(&ws.clinvar).unwrap(), "BRCA1").unwrap();

    let mut buf = Vec::<u8>::new();
    let written = vcf::write_vcf(&clinical, &mut buf).unwrap();

    assert_eq!(written, 3);
    let output = String::from_utf8(buf).unwrap();
    assert_eq!(
        output.lines().next(),
        Some("17\t43057062\t.\tC\tT\t.\tPASS\t.")
    );
}

#[test]
fn test_shipped_schema_matches_default() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/annotation_schema.yaml");
    let schema = AnnotationSchema::load_from_file(&path).unwrap();

    assert_eq!(schema, AnnotationSchema::default());
}
