//! Benchmarks for sectionrank pipeline stages.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic PDF data and synthetic line layouts.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sectionrank::extract::LopdfBackend;
use sectionrank::structure::analyze_document;
use sectionrank::{
    AnalysisConfig, AnalysisRequest, Analyzer, BBox, DocumentId, DocumentRef, Embedder,
    ExtractedDocument, HashingEmbedder, PdfLineExtractor, RawLine,
};

/// Creates a synthetic PDF with one heading and a few body lines per page.
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut content = String::new();

    content.push_str("%PDF-1.4\n");
    content.push_str("1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", i * 2 + 5)).collect();
    content.push_str(&format!(
        "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
        kids.join(" "),
        page_count
    ));

    // Fonts
    content.push_str(
        "3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>\nendobj\n",
    );
    content.push_str(
        "4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>\nendobj\n",
    );

    let mut next_obj = 5;
    for i in 0..page_count {
        let page_obj = next_obj;
        let content_obj = next_obj + 1;
        next_obj += 2;

        content.push_str(&format!(
            "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>\nendobj\n",
            page_obj, content_obj
        ));

        let mut text = format!("BT /F2 16 Tf 72 720 Td (Section {} Overview) Tj ET\n", i + 1);
        for line in 0..12 {
            text.push_str(&format!(
                "BT /F1 11 Tf 72 {} Td (Body line {} of page {} describing the benchmark content.) Tj ET\n",
                690 - line * 14,
                line + 1,
                i + 1
            ));
        }
        text.push_str(&format!("BT /F1 9 Tf 300 40 Td ({}) Tj ET", i + 1));
        content.push_str(&format!(
            "{} 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
            content_obj,
            text.len(),
            text
        ));
    }

    let xref_offset = content.len();
    content.push_str(&format!("xref\n0 {}\n", next_obj));
    content.push_str("0000000000 65535 f \n");
    for _ in 1..next_obj {
        content.push_str("0000000000 00000 n \n");
    }

    content.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        next_obj, xref_offset
    ));

    content.into_bytes()
}

/// Lines of a document with `page_count` pages of three sections each.
fn synthetic_document(document_id: DocumentId, page_count: u32) -> ExtractedDocument {
    let mut lines = Vec::new();
    for page in 1..=page_count {
        let mut y = 72.0;
        for section in 0..3 {
            lines.push(
                RawLine::new(
                    document_id,
                    page,
                    format!("Topic {} part {}", page, section + 1),
                    BBox::new(72.0, y, 300.0, y + 16.0),
                    16.0,
                )
                .with_bold(true),
            );
            y += 24.0;
            for line in 0..6 {
                lines.push(RawLine::new(
                    document_id,
                    page,
                    format!(
                        "Sentence {} of section {} on page {} talks about travel, food and museums.",
                        line, section, page
                    ),
                    BBox::new(72.0, y, 520.0, y + 11.0),
                    11.0,
                ));
                y += 13.0;
            }
            y += 18.0;
        }
        lines.push(RawLine::new(
            document_id,
            page,
            "Company Confidential",
            BBox::new(72.0, 760.0, 200.0, 769.0),
            9.0,
        ));
    }
    ExtractedDocument::new(document_id, format!("doc{}.pdf", document_id.0), page_count, lines)
}

/// Benchmark line extraction from PDF bytes.
fn bench_line_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_extraction");
    let extractor = PdfLineExtractor::new();

    for page_count in [1, 5, 10].iter() {
        let data = create_test_pdf(*page_count);

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| {
                // Synthetic PDFs carry placeholder xref offsets; lopdf may reject them
                if let Ok(backend) = LopdfBackend::load_bytes(black_box(&data)) {
                    let _ = extractor.extract_backend(&backend, DocumentId(0), "bench.pdf");
                }
            });
        });
    }

    group.finish();
}

/// Benchmark noise filtering, classification, merging and outline assembly.
fn bench_structure(c: &mut Criterion) {
    let mut group = c.benchmark_group("structure");
    let config = AnalysisConfig::default();

    for page_count in [5u32, 50].iter() {
        let document = synthetic_document(DocumentId(0), *page_count);
        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| analyze_document(black_box(&document), &config));
        });
    }

    group.finish();
}

/// Benchmark the hashing embedder on a heading-sized batch.
fn bench_embedding(c: &mut Criterion) {
    let embedder = HashingEmbedder::new();
    let texts: Vec<String> = (0..200)
        .map(|i| format!("Heading {} with a paragraph about beaches, museums and food.", i))
        .collect();

    c.bench_function("hashing_embed_200", |b| {
        b.iter(|| embedder.embed_batch(black_box(&texts)));
    });
}

/// Benchmark a full run over an already extracted collection.
fn bench_collection(c: &mut Criterion) {
    let request = AnalysisRequest::new(
        "Travel Planner",
        "Plan a trip of 4 days for a group of 10 college friends.",
        (0..5).map(|i| DocumentRef::new(format!("doc{}.pdf", i), "")).collect(),
    );
    let analyzer = Analyzer::new().with_timestamp("bench");

    c.bench_function("collection_5_docs", |b| {
        b.iter(|| {
            let documents = (0..5)
                .map(|i| Ok(synthetic_document(DocumentId(i), 10)))
                .collect();
            analyzer.analyze_extracted(black_box(&request), documents)
        });
    });
}

criterion_group!(
    benches,
    bench_line_extraction,
    bench_structure,
    bench_embedding,
    bench_collection,
);
criterion_main!(benches);
