//! Minimal VCF body emitter.
//!
//! Writes one line per clinical record, with only the mandatory columns:
//! `CHROM POS ID REF ALT QUAL FILTER INFO`, where ID, QUAL and INFO are `.`
//! and FILTER is `PASS`. No `##` meta lines or `#CHROM` header are written.

use crate::runtime::PipelineError;
use crate::serialization::SerializationError;
use crate::table::Table;
use std::io::Write;

pub const CHROMOSOME: &str = "Chromosome";
pub const POSITION: &str = "PositionVCF";
pub const REFERENCE: &str = "ReferenceAlleleVCF";
pub const ALTERNATE: &str = "AlternateAlleleVCF";

/// Chromosome name as written to the VCF.
///
/// Names are passed through unchanged; bare numbers do not gain a `chr`
/// prefix.
pub fn format_chromosome(chrom: &str) -> &str {
    chrom
}

/// One VCF data line, without the trailing newline.
pub fn format_vcf_line(chrom: &str, pos: &str, reference: &str, alternate: &str) -> String {
    format!(
        "{}\t{}\t.\t{}\t{}\t.\tPASS\t.",
        format_chromosome(chrom),
        pos,
        reference,
        alternate
    )
}

/// Write the VCF body for every row of `table`.
///
/// Returns the number of lines written.
///
/// # Errors
/// Fails if one of the VCF source columns is missing or writing fails.
pub fn write_vcf<W: Write>(table: &Table, mut writer: W) -> Result<usize, PipelineError> {
    table.require_columns(&[CHROMOSOME, POSITION, REFERENCE, ALTERNATE], "clinical table")?;

    let mut unprefixed = 0;
    for row in table.rows() {
        let chrom = row.get_or_na(CHROMOSOME);
        if !chrom.starts_with("chr") {
            unprefixed += 1;
        }

        let line = format_vcf_line(
            chrom,
            row.get_or_na(POSITION),
            row.get_or_na(REFERENCE),
            row.get_or_na(ALTERNATE),
        );
        writeln!(writer, "{}", line).map_err(SerializationError::from)?;
    }
    writer.flush().map_err(SerializationError::from)?;

    if unprefixed > 0 {
        tracing::warn!(
            "{} of {} records have a chromosome without a 'chr' prefix; written unchanged",
            unprefixed,
            table.len()
        );
    }

    Ok(table.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clinical_table() -> Table {
        let mut table = Table::new(
            ["GeneSymbol", CHROMOSOME, POSITION, REFERENCE, ALTERNATE]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        table
            .push_values(
                0,
                ["BRCA1", "17", "43057062", "C", "T"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            )
            .unwrap();
        table
            .push_values(
                1,
                ["BRCA1", "chr17", "43106487", "A", "G"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            )
            .unwrap();
        table
    }

    #[test]
    fn test_format_vcf_line() {
        assert_eq!(
            format_vcf_line("chr17", "43057062", "C", "T"),
            "chr17\t43057062\t.\tC\tT\t.\tPASS\t."
        );
    }

    #[test]
    fn test_chromosome_passed_through() {
        assert_eq!(format_chromosome("17"), "17");
        assert_eq!(format_chromosome("chrX"), "chrX");
    }

    #[test]
    fn test_write_vcf() {
        let mut buf = Vec::new();
        let written = write_vcf(&clinical_table(), &mut buf).unwrap();

        assert_eq!(written, 2);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines, vec![
            "17\t43057062\t.\tC\tT\t.\tPASS\t.",
            "chr17\t43106487\t.\tA\tG\t.\tPASS\t.",
        ]);
        assert!(lines.iter().all(|l| l.split('\t').count() == 8));
    }

    #[test]
    fn test_write_vcf_missing_column() {
        let table = Table::new(vec![CHROMOSOME.to_string()]);
        let result = write_vcf(&table, Vec::<u8>::new());

        assert!(matches!(result, Err(PipelineError::Table(_))));
    }
}
