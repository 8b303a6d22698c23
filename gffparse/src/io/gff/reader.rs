use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use arcstr::ArcStr;
use hashbrown::HashMap;
use indexmap::IndexMap;
use log::{debug, info, warn};

use super::attributes::ParsedAttributes;
use super::builder::{build_feature, BuiltFeature};
use super::config::ParserConfig;
use super::line::{classify_line, GffLine};
use crate::data_structs::annotation::{
    Feature, FeatureAssembler, FeatureId, FeatureIndex, GeneQuery, GffFeature,
    Orphan,
};
use crate::data_structs::typedef::{PosType, SeqNameStr};
use crate::data_structs::GffVersion;
use crate::io::compression::Compression;
use crate::utils::non_placeholder;

/// Line reader with a one-line push-back slot, used to replay the line read
/// while probing for a version pragma.
struct LineSource {
    reader:    Box<dyn BufRead>,
    replay:    Option<String>,
    buffer:    Vec<u8>,
    line_no:   usize,
    exhausted: bool,
}

impl LineSource {
    fn new<R: BufRead + 'static>(reader: R) -> Self {
        Self {
            reader:    Box::new(reader),
            replay:    None,
            buffer:    Vec::with_capacity(512),
            line_no:   0,
            exhausted: false,
        }
    }

    fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        if let Some(line) = self.replay.take() {
            return Ok(Some(line));
        }
        if self.exhausted {
            return Ok(None);
        }
        self.buffer.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.buffer)
            .with_context(|| format!("Failed to read line {}", self.line_no + 1))?;
        if n == 0 {
            self.exhausted = true;
            return Ok(None);
        }
        self.line_no += 1;
        let line = String::from_utf8_lossy(&self.buffer);
        Ok(Some(
            line.trim_end_matches(['\n', '\r'])
                .to_string(),
        ))
    }

    fn push_back(
        &mut self,
        line: String,
    ) {
        self.replay = Some(line);
    }

    /// Stops reading; everything after the current line is ignored.
    fn finish(&mut self) {
        self.replay = None;
        self.exhausted = true;
    }
}

/// Parser session over one annotation stream.
///
/// Features can be pulled one at a time with [`next_feature`] (no
/// hierarchy), or the whole stream can be assembled into a forest with
/// [`parse_file`], which the top-level accessors call on first use. The
/// feature type is chosen through `F`; [`Feature`] is the default.
///
/// [`next_feature`]: GffParser::next_feature
/// [`parse_file`]: GffParser::parse_file
pub struct GffParser<F: GffFeature = Feature> {
    config:     ParserConfig,
    version:    Option<GffVersion>,
    source:     Option<LineSource>,
    comments:   Vec<String>,
    regions:    IndexMap<SeqNameStr, PosType>,
    assembler:  FeatureAssembler<F>,
    index:      Option<FeatureIndex>,
    top_cursor: usize,
    eof:        bool,
}

impl<F: GffFeature> GffParser<F> {
    /// Creates a parser with no input bound. Only [`parse_line`] works until
    /// a stream is opened.
    ///
    /// [`parse_line`]: GffParser::parse_line
    pub fn new(config: ParserConfig) -> Self {
        Self {
            version: config.version,
            config,
            source: None,
            comments: Vec::new(),
            regions: IndexMap::new(),
            assembler: FeatureAssembler::new(),
            index: None,
            top_cursor: 0,
            eof: false,
        }
    }

    pub fn from_path<P: AsRef<Path>>(
        path: P,
        config: ParserConfig,
    ) -> anyhow::Result<Self> {
        let mut parser = Self::new(config);
        parser.open(path)?;
        Ok(parser)
    }

    pub fn from_reader<R: BufRead + 'static>(
        reader: R,
        config: ParserConfig,
    ) -> anyhow::Result<Self> {
        let mut parser = Self::new(config);
        parser.open_reader(reader)?;
        Ok(parser)
    }

    /// Opens an annotation file and starts a new session. The dialect is
    /// guessed from the extension; compressed files are decoded when the
    /// `compression` feature is enabled. On error the parser is left
    /// untouched.
    pub fn open<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> anyhow::Result<()> {
        let path = path.as_ref();
        let guess = GffVersion::from_path(path)?;
        let handle = File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let compression = Compression::from_path(path);
        let decoder = compression.get_decoder(handle)?;
        debug!(
            "Opened {} (compression: {})",
            path.display(),
            compression.name()
        );

        self.reset();
        if let Some(guess) = guess {
            self.apply_version(guess, "file extension");
        }
        self.install(BufReader::new(decoder))
    }

    /// Starts a new session over an already opened stream.
    pub fn open_reader<R: BufRead + 'static>(
        &mut self,
        reader: R,
    ) -> anyhow::Result<()> {
        self.reset();
        self.install(reader)
    }

    fn reset(&mut self) {
        self.version = None;
        self.source = None;
        self.comments.clear();
        self.regions.clear();
        self.assembler = FeatureAssembler::new();
        self.index = None;
        self.top_cursor = 0;
        self.eof = false;
    }

    /// Binds the stream, then peeks at its first line: a version pragma is
    /// consumed, anything else is replayed as the first line.
    fn install<R: BufRead + 'static>(
        &mut self,
        reader: R,
    ) -> anyhow::Result<()> {
        if let Some(version) = self.config.version {
            self.apply_version(version, "configuration");
        }
        let mut source = LineSource::new(reader);
        if let Some(first) = source.next_line()? {
            match classify_line(&first) {
                GffLine::VersionPragma(value) => self.apply_pragma(&value),
                _ => source.push_back(first),
            }
        }
        self.source = Some(source);
        Ok(())
    }

    fn apply_version(
        &mut self,
        version: GffVersion,
        origin: &str,
    ) {
        if let Some(current) = self.version {
            if current != version {
                warn!(
                    "GFF version {} from {} replaces previously set version {}",
                    version, origin, current
                );
            }
        }
        debug!("Using GFF version {} ({})", version, origin);
        self.version = Some(version);
    }

    fn apply_pragma(
        &mut self,
        value: &str,
    ) {
        match GffVersion::from_pragma(value) {
            Some(version) => self.apply_version(version, "##gff-version pragma"),
            None => warn!("Ignoring unsupported ##gff-version {}", value),
        }
    }

    /// Resolved dialect, `None` while still unknown.
    pub fn version(&self) -> Option<GffVersion> { self.version }

    /// Overrides the dialect. Only `1`, `2`, `2.5` and `3` are accepted; any
    /// other value is an error and leaves the parser unchanged.
    pub fn set_version(
        &mut self,
        version: &str,
    ) -> anyhow::Result<()> {
        let version: GffVersion = version.parse()?;
        self.apply_version(version, "caller");
        Ok(())
    }

    pub fn config(&self) -> &ParserConfig { &self.config }

    /// Reads the next feature without linking it to anything. Pragmas and
    /// comments met on the way update the session.
    pub fn next_feature(&mut self) -> anyhow::Result<Option<F>> {
        Ok(self.next_built()?.map(|b| b.feature))
    }

    fn next_built(&mut self) -> anyhow::Result<Option<BuiltFeature<F>>> {
        loop {
            let (line, line_no) = {
                let source = self
                    .source
                    .as_mut()
                    .ok_or_else(|| anyhow!("No input stream is bound to the parser"))?;
                match source.next_line()? {
                    Some(line) => (line, source.line_no),
                    None => return Ok(None),
                }
            };

            match classify_line(&line) {
                GffLine::Record(raw) => {
                    // Matched on column 3 as written, before GTF type refinement
                    if self.config.skips(non_placeholder(&raw.primary_tag)) {
                        continue;
                    }
                    let attributes = ParsedAttributes::parse(
                        self.version,
                        &raw.attributes,
                        self.config.simplify,
                    );
                    return Ok(Some(build_feature(
                        &raw,
                        attributes,
                        self.config.simplify,
                    )));
                },
                GffLine::VersionPragma(value) => self.apply_pragma(&value),
                GffLine::SequenceRegion { seq_id, end, .. } => {
                    self.regions
                        .insert(ArcStr::from(seq_id.as_str()), end);
                },
                line @ GffLine::Comment(_) => {
                    let fasta = line.is_fasta_pragma();
                    if let GffLine::Comment(text) = line {
                        self.comments.push(text);
                    }
                    if fasta {
                        debug!("Reached ##FASTA at line {}; stopping", line_no);
                        if let Some(source) = self.source.as_mut() {
                            source.finish();
                        }
                    }
                },
                GffLine::Malformed(reason) => {
                    warn!("Skipping line {}: {}", line_no, reason);
                },
                GffLine::SubfeatureClose
                | GffLine::Blank
                | GffLine::FastaHeader
                | GffLine::FastaSequence => {},
            }
        }
    }

    /// Builds a feature from a single line using the session's dialect and
    /// options. Returns `None` for anything that is not a feature line.
    pub fn parse_line(
        &self,
        line: &str,
    ) -> Option<F> {
        match classify_line(line) {
            GffLine::Record(raw) => {
                let attributes = ParsedAttributes::parse(
                    self.version,
                    &raw.attributes,
                    self.config.simplify,
                );
                Some(build_feature(&raw, attributes, self.config.simplify).feature)
            },
            GffLine::Malformed(reason) => {
                warn!("Cannot parse line: {}", reason);
                None
            },
            _ => None,
        }
    }

    /// Reads the rest of the stream, assembles the hierarchy, resolves
    /// orphans and builds the indexes. Runs once; later calls return
    /// immediately.
    pub fn parse_file(&mut self) -> anyhow::Result<()> {
        if self.eof {
            return Ok(());
        }
        if self.source.is_none() {
            bail!("No input stream is bound to the parser");
        }

        let mut n_features = 0usize;
        while let Some(built) = self.next_built()? {
            self.assembler.push(built, self.version);
            n_features += 1;
        }
        let resolved = self.assembler.resolve_orphans();
        if resolved > 0 {
            debug!("Resolved {} forward parent reference(s)", resolved);
        }
        self.assembler.report();
        self.index = Some(FeatureIndex::build(&self.assembler, &self.regions));
        self.eof = true;

        info!(
            "Parsed {} features into {} top-level features",
            n_features,
            self.assembler.top_level().len()
        );
        Ok(())
    }

    /// `true` once the full pass has completed.
    pub fn is_finished(&self) -> bool { self.eof }

    /// Next top-level feature of the assembled forest.
    pub fn next_top_feature(&mut self) -> anyhow::Result<Option<FeatureId>> {
        self.parse_file()?;
        let next = self
            .assembler
            .top_level()
            .get(self.top_cursor)
            .copied();
        if next.is_some() {
            self.top_cursor += 1;
        }
        Ok(next)
    }

    pub fn top_features(&mut self) -> anyhow::Result<&[FeatureId]> {
        self.parse_file()?;
        Ok(self.assembler.top_level())
    }

    pub fn feature(
        &self,
        id: FeatureId,
    ) -> Option<&F> {
        self.assembler.feature(id)
    }

    /// Looks a feature up by its `ID` (GFF3) or gene/transcript id (GTF).
    pub fn get_by_id(
        &self,
        primary_id: &str,
    ) -> Option<FeatureId> {
        self.assembler.get_by_id(primary_id)
    }

    pub fn assembler(&self) -> &FeatureAssembler<F> { &self.assembler }

    pub fn orphans(&self) -> &[Orphan] { self.assembler.orphans() }

    pub fn unparented(&self) -> &[FeatureId] { self.assembler.unparented() }

    pub fn duplicate_ids(&self) -> &HashMap<String, usize> {
        self.assembler.duplicates()
    }

    /// Comment and pragma lines, in file order.
    pub fn comments(&self) -> &[String] { &self.comments }

    pub fn seq_lengths(
        &mut self
    ) -> anyhow::Result<&IndexMap<SeqNameStr, PosType>> {
        self.parse_file()?;
        self.index
            .as_ref()
            .map(FeatureIndex::seq_lengths)
            .ok_or_else(|| anyhow!("Feature index was not built"))
    }

    pub fn seq_ids(&mut self) -> anyhow::Result<Vec<SeqNameStr>> {
        Ok(self.seq_lengths()?.keys().cloned().collect())
    }

    /// See [`FeatureIndex::find_gene`].
    pub fn find_gene(
        &mut self,
        query: &GeneQuery,
    ) -> anyhow::Result<Option<FeatureId>> {
        self.parse_file()?;
        Ok(self
            .index
            .as_ref()
            .and_then(|index| index.find_gene(&self.assembler, query)))
    }
}

impl<F: GffFeature> Iterator for GffParser<F> {
    type Item = anyhow::Result<F>;

    fn next(&mut self) -> Option<Self::Item> { self.next_feature().transpose() }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;
    use crate::data_structs::annotation::PARENT_TAG;

    fn parser_over(
        text: &'static str,
        config: ParserConfig,
    ) -> GffParser {
        GffParser::from_reader(Cursor::new(text.as_bytes()), config).unwrap()
    }

    #[test]
    fn test_first_line_replayed() {
        let mut parser = parser_over(
            "chr1\tsrc\tgene\t1\t100\t.\t+\t.\tID=g1\n\
             chr1\tsrc\tmRNA\t1\t100\t.\t+\t.\tID=t1;Parent=g1\n",
            ParserConfig::default().with_version(Some(GffVersion::Gff3)),
        );
        let first = parser.next_feature().unwrap().unwrap();
        assert_eq!(first.primary_id(), Some("g1"));
        let second = parser.next_feature().unwrap().unwrap();
        assert_eq!(second.primary_id(), Some("t1"));
        assert!(parser.next_feature().unwrap().is_none());
        assert!(parser.next_feature().unwrap().is_none());
    }

    #[test]
    fn test_version_pragma_consumed() {
        let mut parser = parser_over(
            "##gff-version 3\nchr1\tsrc\tgene\t1\t100\t.\t+\t.\tID=g1\n",
            ParserConfig::default(),
        );
        assert_eq!(parser.version(), Some(GffVersion::Gff3));
        assert!(parser.next_feature().unwrap().is_some());
        assert!(parser.comments().is_empty());
    }

    #[test]
    fn test_pragma_overrides_config() {
        let parser = parser_over(
            "##gff-version 2.5\n",
            ParserConfig::default().with_version(Some(GffVersion::Gff3)),
        );
        assert_eq!(parser.version(), Some(GffVersion::Gtf));
    }

    #[rstest]
    #[case::gff1("1", GffVersion::Gff1)]
    #[case::gff2("2", GffVersion::Gff2)]
    #[case::gtf("2.5", GffVersion::Gtf)]
    #[case::gff3("3", GffVersion::Gff3)]
    fn test_set_version(
        #[case] value: &str,
        #[case] expected: GffVersion,
    ) {
        let mut parser: GffParser = GffParser::new(ParserConfig::default());
        parser.set_version(value).unwrap();
        assert_eq!(parser.version(), Some(expected));
    }

    #[rstest]
    #[case::four("4")]
    #[case::patch("3.1")]
    #[case::word("gtf")]
    fn test_set_version_rejected(#[case] value: &str) {
        let mut parser: GffParser = GffParser::new(
            ParserConfig::default().with_version(Some(GffVersion::Gff3)),
        );
        assert!(parser.set_version(value).is_err());
        assert_eq!(parser.version(), Some(GffVersion::Gff3));
    }

    #[test]
    fn test_unbound_parser_fails() {
        let mut parser: GffParser = GffParser::new(ParserConfig::default());
        assert!(parser.next_feature().is_err());
        assert!(parser.parse_file().is_err());
        assert!(parser.top_features().is_err());
    }

    #[test]
    fn test_pragmas_and_comments() {
        let mut parser = parser_over(
            "##gff-version 3\n\
             ##sequence-region chr1 1 5000\n\
             ##sequence-region chr2 1 abc\n\
             # a comment\n\
             \n\
             ###\n\
             chr1\tsrc\tgene\t1\t100\t.\t+\t.\tID=g1\n\
             bad line\n",
            ParserConfig::default(),
        );
        parser.parse_file().unwrap();
        assert_eq!(parser.comments(), &["# a comment".to_string()]);
        let lengths = parser.seq_lengths().unwrap();
        assert_eq!(lengths.len(), 1);
        assert_eq!(lengths.get("chr1"), Some(&5000));
        assert_eq!(parser.top_features().unwrap().len(), 1);
    }

    #[test]
    fn test_fasta_section_ends_features() {
        let mut parser = parser_over(
            "##gff-version 3\n\
             chr1\tsrc\tgene\t1\t100\t.\t+\t.\tID=g1\n\
             ##FASTA\n\
             >chr1\n\
             ACGTNNACGT\n\
             chr1\tsrc\tgene\t200\t300\t.\t+\t.\tID=g2\n",
            ParserConfig::default(),
        );
        assert_eq!(parser.top_features().unwrap().len(), 1);
        assert_eq!(parser.comments(), &["##FASTA".to_string()]);
        assert!(parser.get_by_id("g2").is_none());
    }

    #[test]
    fn test_skip_set_applies_to_stream() {
        let mut parser = parser_over(
            "chr1\tsrc\tgene\t1\t100\t.\t+\t.\tID=g1\n\
             chr1\tsrc\tchromosome\t1\t1000\t.\t.\t.\tID=chr1\n",
            ParserConfig::default()
                .with_version(Some(GffVersion::Gff3))
                .with_skip_type("chromosome"),
        );
        let tags: Vec<String> = parser
            .by_ref()
            .map(|f| f.unwrap().primary_tag.unwrap().to_string())
            .collect();
        assert_eq!(tags, vec!["gene".to_string()]);
    }

    #[test]
    fn test_parse_line_keeps_state() {
        let parser: GffParser = GffParser::new(
            ParserConfig::default().with_version(Some(GffVersion::Gff3)),
        );
        let feature = parser
            .parse_line("chr1\tsrc\texon\t10\t20\t0.5\t-\t0\tID=e1;Parent=t1")
            .unwrap();
        assert_eq!(feature.start, 10);
        assert_eq!(feature.tag_values(PARENT_TAG), &["t1".to_string()]);
        assert!(parser.parse_line("##gff-version 3").is_none());
        assert!(parser.parse_line("a\tb").is_none());
        assert!(parser.assembler().is_empty());
    }

    #[test]
    fn test_top_feature_cursor() {
        let mut parser = parser_over(
            "##gff-version 3\n\
             chr1\tsrc\tgene\t1\t100\t.\t+\t.\tID=g1\n\
             chr1\tsrc\tmRNA\t1\t100\t.\t+\t.\tID=t1;Parent=g1\n\
             chr2\tsrc\tgene\t5\t50\t.\t-\t.\tID=g2\n",
            ParserConfig::default(),
        );
        let first = parser.next_top_feature().unwrap().unwrap();
        let second = parser.next_top_feature().unwrap().unwrap();
        assert!(parser.next_top_feature().unwrap().is_none());
        assert_eq!(parser.feature(first).unwrap().primary_id(), Some("g1"));
        assert_eq!(parser.feature(second).unwrap().primary_id(), Some("g2"));
        assert_eq!(parser.seq_ids().unwrap().len(), 2);
    }
}
