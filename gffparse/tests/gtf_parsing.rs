mod common;

use std::io::Cursor;

use common::data_path;
use gffparse::prelude::*;
use rstest::{fixture, rstest};

#[fixture]
fn parsed() -> GffParser {
    let mut parser: GffParser =
        GffParser::from_path(data_path("sample.gtf"), ParserConfig::default())
            .unwrap();
    parser.parse_file().unwrap();
    parser
}

fn by_id<'a>(
    parser: &'a GffParser,
    id: &str,
) -> &'a Feature {
    parser
        .get_by_id(id)
        .and_then(|key| parser.feature(key))
        .unwrap_or_else(|| panic!("no feature with id {id}"))
}

fn child_tags(
    parser: &GffParser,
    id: &str,
) -> Vec<String> {
    by_id(parser, id)
        .children
        .iter()
        .filter_map(|&c| parser.feature(c))
        .map(|f| f.primary_tag.as_deref().unwrap_or(".").to_string())
        .collect()
}

#[rstest]
fn test_synthesized_gene_model(mut parsed: GffParser) -> anyhow::Result<()> {
    assert_eq!(parsed.version(), Some(GffVersion::Gtf));
    assert_eq!(parsed.top_features()?.len(), 2);

    let gene = by_id(&parsed, "G1");
    assert_eq!(gene.primary_tag.as_deref(), Some("gene"));
    assert_eq!(gene.display_name.as_deref(), Some("Alpha"));
    assert_eq!((gene.start, gene.end), (1000, 2600));
    assert_eq!(gene.children.len(), 2);

    let t1 = by_id(&parsed, "T1");
    assert_eq!(t1.primary_tag.as_deref(), Some("mRNA"));
    assert_eq!((t1.start, t1.end), (1000, 2600));
    assert_eq!(t1.tag_values(PARENT_TAG), &["G1"]);
    assert_eq!(
        child_tags(&parsed, "T1"),
        vec!["exon", "CDS", "exon", "start_codon"]
    );
    let exon = parsed.feature(t1.children[0]).unwrap();
    assert_eq!(exon.tag_values("transcript_biotype"), &["protein_coding"]);

    let t2 = by_id(&parsed, "T2");
    assert_eq!(t2.primary_tag.as_deref(), Some("lincRNA"));
    assert_eq!((t2.start, t2.end), (1500, 1700));
    Ok(())
}

#[rstest]
fn test_explicit_gene_model(parsed: GffParser) {
    let gene = by_id(&parsed, "G2");
    assert_eq!(gene.display_name.as_deref(), Some("Beta"));
    assert_eq!(gene.source.as_deref(), Some("havana"));
    assert_eq!(gene.strand, Strand::Reverse);

    let t3 = by_id(&parsed, "T3");
    assert_eq!(t3.primary_tag.as_deref(), Some("mRNA"));
    assert_eq!(child_tags(&parsed, "G2"), vec!["mRNA"]);
    assert_eq!(child_tags(&parsed, "T3"), vec!["exon"]);
}

#[rstest]
fn test_nothing_left_over(parsed: GffParser) {
    assert!(parsed.orphans().is_empty());
    assert!(parsed.unparented().is_empty());
    assert!(parsed.duplicate_ids().is_empty());
}

#[test]
fn test_skip_start_codon() -> anyhow::Result<()> {
    let mut parser: GffParser = GffParser::from_path(
        data_path("sample.gtf"),
        ParserConfig::default().with_skip_type("start_codon"),
    )?;
    parser.parse_file()?;
    assert_eq!(child_tags(&parser, "T1"), vec!["exon", "CDS", "exon"]);
    Ok(())
}

#[rstest]
#[case::coding_biotype("protein_coding")]
#[case::rna_biotype("lincRNA")]
#[case::unknown_biotype("misc")]
fn test_skip_uses_written_type(#[case] biotype: &str) -> anyhow::Result<()> {
    let text = format!(
        "##gff-version 2.5\n\
         chr1\tsrc\ttranscript\t1\t100\t.\t+\t.\tgene_id \"G\"; transcript_id \"T\"; transcript_biotype \"{biotype}\";\n\
         chr1\tsrc\texon\t1\t50\t.\t+\t.\tgene_id \"G\"; transcript_id \"T\";\n"
    );
    let mut parser: GffParser = GffParser::from_reader(
        Cursor::new(text.into_bytes()),
        ParserConfig::default().with_skip_type("transcript"),
    )?;
    let tags: Vec<String> = parser
        .by_ref()
        .map(|f| f.map(|f| f.primary_tag.as_deref().unwrap_or(".").to_string()))
        .collect::<anyhow::Result<_>>()?;
    assert_eq!(tags, vec!["exon"]);
    Ok(())
}

#[test]
fn test_unknown_attributes_kept() -> anyhow::Result<()> {
    let text = "##gff-version 2.5\n\
                chr1\tsrc\texon\t1\t10\t.\t+\t.\tgene_id \"g\"; transcript_id \"t\"; exon_number \"1\"; tag \"basic\";\n";
    let mut parser: GffParser =
        GffParser::from_reader(Cursor::new(text.as_bytes()), ParserConfig::default())?;
    let exon = parser.next_feature()?.unwrap();
    assert_eq!(exon.tag_values("exon_number"), &["1"]);
    assert_eq!(exon.tag_values("tag"), &["basic"]);
    assert_eq!(exon.tag_values(PARENT_TAG), &["t"]);
    Ok(())
}

#[test]
fn test_simplified_gtf() -> anyhow::Result<()> {
    let mut parser: GffParser = GffParser::from_path(
        data_path("sample.gtf"),
        ParserConfig::default().with_simplify(true),
    )?;
    parser.parse_file()?;
    let t1 = by_id(&parser, "T1");
    assert_eq!(t1.primary_tag.as_deref(), Some("mRNA"));
    let exon = parser.feature(t1.children[0]).unwrap();
    assert!(!exon.has_tag("transcript_biotype"));
    assert_eq!(exon.tag_values(PARENT_TAG), &["T1"]);
    Ok(())
}

#[rstest]
#[case::gff2_pragma("##gff-version 2\n")]
#[case::no_pragma("")]
fn test_generic_dialect_is_flat(#[case] header: &str) -> anyhow::Result<()> {
    let text = format!(
        "{header}chr1\tsrc\tgene\t1\t100\t.\t+\t.\tgene_id g1; note some text\n\
         chr1\tsrc\texon\t1\t50\t.\t+\t.\tgene_id g1; transcript_id t1; Parent g1\n"
    );
    let mut parser: GffParser =
        GffParser::from_reader(Cursor::new(text.into_bytes()), ParserConfig::default())?;
    let top = parser.top_features()?.to_vec();
    assert_eq!(top.len(), 2);
    let gene = parser.feature(top[0]).unwrap();
    assert!(gene.primary_id.is_none());
    assert_eq!(gene.tag_values("note"), &["some text"]);
    assert!(gene.children.is_empty());
    Ok(())
}
