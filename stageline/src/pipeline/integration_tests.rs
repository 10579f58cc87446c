//! End-to-end tests for pipeline assembly and execution.

#[cfg(test)]
mod tests {
    use crate::config::RunConfig;
    use crate::errors::{ConfigurationError, PipelineError, TopologyError};
    use crate::pipeline::{PipelineBuilder, Transform, IDENTITY_TRANSFORM};
    use crate::stages::{Sink, Source, Stage};
    use crate::testing::{init_test_tracing, vec_source, CallLog, CollectingSink};
    use pretty_assertions::assert_eq;
    use std::fs::{self, File};
    use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
    use std::path::PathBuf;

    fn elementwise(name: &str, op: fn(i64) -> i64) -> Transform<i64> {
        Transform::from_fn(name, move |inputs: Vec<Option<i64>>| {
            Ok(inputs.into_iter().map(|value| value.map(op)).collect())
        })
    }

    fn numbers_job(gathered: &CollectingSink<i64>) -> PipelineBuilder<i64> {
        PipelineBuilder::new("numbers")
            .add(vec_source("small", [1, 2, 3]))
            .add(vec_source("big", [10, 20, 30]))
            .add(elementwise("add_one", |n| n + 1))
            .add(elementwise("double", |n| n * 2))
            .add(gathered.sink("gather"))
            .add(Sink::discard("void"))
    }

    fn expected_numbers() -> Vec<Vec<Option<i64>>> {
        vec![
            vec![Some(4), Some(22)],
            vec![Some(6), Some(42)],
            vec![Some(8), Some(62)],
        ]
    }

    #[test]
    fn test_a_source_is_required() {
        let err = PipelineBuilder::<i64>::new("empty").build().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Configuration(ConfigurationError::MissingSource { .. })
        ));
    }

    #[test]
    fn test_a_sink_is_required() {
        let err = PipelineBuilder::new("no_sink")
            .add(vec_source("small", [1]))
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Pipeline 'no_sink' needs at least one sink");
        assert_eq!(err.info().code, "CONFIG-NO_SINK");
    }

    #[test]
    fn test_a_transform_is_optional_with_a_pass_through_default() {
        let mut pipeline = PipelineBuilder::new("pass")
            .add(vec_source("symbols", ["pass_through"]))
            .add(Sink::discard("void"))
            .build()
            .unwrap();

        assert_eq!(pipeline.name(), IDENTITY_TRANSFORM);
        assert_eq!(pipeline.advance().unwrap(), Some(vec![Some("pass_through")]));
    }

    #[test]
    fn test_pass_through_keeps_positions_of_uneven_sources() {
        let gathered = CollectingSink::new();
        let mut pipeline = PipelineBuilder::new("uneven")
            .add(vec_source("short", [1]))
            .add(vec_source("long", [10, 20]))
            .add(gathered.sink("gather"))
            .build()
            .unwrap();

        pipeline.run().unwrap();

        assert_eq!(gathered.written(), vec![vec![Some(1), Some(10)], vec![None, Some(20)]]);
        assert_eq!(gathered.finish_count(), 1);
    }

    #[test]
    fn test_adds_can_be_chained_or_pushed() {
        let mut builder = PipelineBuilder::new("counts")
            .add(vec_source("a", [1]))
            .add(elementwise("noop", |n| n));
        builder
            .push(Sink::discard("x"))
            .push(Sink::discard("y"));

        assert_eq!(builder.name(), "counts");
        assert_eq!(builder.source_count(), 1);
        assert_eq!(builder.transform_count(), 1);
        assert_eq!(builder.sink_count(), 2);
    }

    #[test]
    fn test_the_last_transform_is_returned() {
        let gathered = CollectingSink::new();
        let pipeline = numbers_job(&gathered).build().unwrap();

        assert_eq!(pipeline.name(), "double");
        assert_eq!(pipeline.chain_names(), vec!["add_one", "double"]);
    }

    #[test]
    fn test_sources_feed_first_transform_and_sinks_hang_off_last() {
        let gathered = CollectingSink::new();
        let pipeline = numbers_job(&gathered).build().unwrap();

        let first = pipeline.upstream().unwrap();
        let source_names: Vec<&str> = first.sources().iter().map(Source::name).collect();
        let sink_names: Vec<&str> = pipeline.sinks().iter().map(Sink::name).collect();

        assert_eq!(source_names, vec!["small", "big"]);
        assert!(pipeline.sources().is_empty());
        assert!(!first.has_outputs());
        assert_eq!(sink_names, vec!["gather", "void"]);
    }

    #[test]
    fn test_sources_feed_chained_transforms_which_feed_sinks() {
        init_test_tracing();
        let gathered = CollectingSink::new();
        let mut pipeline = numbers_job(&gathered).build().unwrap();

        let summary = pipeline.run().unwrap();

        assert_eq!(gathered.written(), expected_numbers());
        assert_eq!(gathered.finish_count(), 1);
        assert_eq!(summary.steps, 3);
        assert!(summary.finished);
        assert_eq!(summary.pipeline, "double");
        assert!(pipeline.sinks().iter().all(Sink::is_finished));
        assert!(pipeline.upstream().unwrap().is_finished());
    }

    #[test]
    fn test_single_declared_transform_gets_sources_and_sinks() {
        let gathered = CollectingSink::new();
        let mut pipeline = PipelineBuilder::new("single")
            .add(vec_source("a", [1, 2]))
            .add(vec_source("b", [3, 4]))
            .add(elementwise("negate", |n| -n))
            .add(gathered.sink("gather"))
            .build()
            .unwrap();

        assert!(pipeline.upstream().is_none());
        assert_eq!(pipeline.sources().len(), 2);

        pipeline.run().unwrap();
        assert_eq!(
            gathered.written(),
            vec![vec![Some(-1), Some(-3)], vec![Some(-2), Some(-4)]]
        );
    }

    #[test]
    fn test_declaration_order_across_roles_does_not_matter() {
        let gathered = CollectingSink::new();
        let mut pipeline = PipelineBuilder::new("shuffled")
            .add(gathered.sink("gather"))
            .add(elementwise("add_one", |n| n + 1))
            .add(vec_source("small", [1, 2, 3]))
            .add(elementwise("double", |n| n * 2))
            .add(vec_source("big", [10, 20, 30]))
            .build()
            .unwrap();

        pipeline.run().unwrap();
        assert_eq!(gathered.written(), expected_numbers());
    }

    #[test]
    fn test_transform_with_sinks_cannot_be_chained_by_builder() {
        let mut early = elementwise("early", |n| n);
        early.add_output(Sink::discard("stray"));

        let err = PipelineBuilder::new("bad")
            .add(vec_source("a", [1]))
            .add(early)
            .add(elementwise("late", |n| n))
            .add(Sink::discard("void"))
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Topology(TopologyError::UpstreamHasOutputs { ref upstream, .. })
                if upstream == "early"
        ));
    }

    #[test]
    fn test_transform_with_sources_cannot_be_chained_downstream() {
        let mut late = elementwise("late", |n| n);
        late.add_input(vec_source("stray", [1])).unwrap();

        let err = PipelineBuilder::new("bad")
            .add(vec_source("a", [1]))
            .add(elementwise("early", |n| n))
            .add(late)
            .add(Sink::discard("void"))
            .build()
            .unwrap_err();

        assert!(matches!(err, PipelineError::Topology(TopologyError::MixedInputs { .. })));
    }

    #[test]
    fn test_every_stage_is_prepared_and_finished_once() {
        let log = CallLog::new();
        let stage = |name: &'static str| {
            let prepares = log.clone();
            let finishes = log.clone();
            Stage::with_prepare(name, move || {
                prepares.record(format!("prepare:{name}"));
                Ok(())
            })
            .on_finish(move |_| {
                finishes.record(format!("finish:{name}"));
                Ok(())
            })
        };

        let mut remaining = 2;
        let mut pipeline = PipelineBuilder::new("lifecycle")
            .add(Source::new(stage("source"), move |()| {
                remaining -= 1;
                Ok((remaining >= 0).then_some(remaining))
            }))
            .add(Transform::new(stage("first"), |(), inputs: Vec<Option<i32>>| Ok(inputs)))
            .add(Transform::new(stage("second"), |(), inputs: Vec<Option<i32>>| Ok(inputs)))
            .add(Sink::new(stage("sink"), |(), _: &[Option<i32>]| Ok(())))
            .build()
            .unwrap();

        pipeline.run().unwrap();
        pipeline.run().unwrap();
        assert_eq!(pipeline.advance().unwrap(), None);

        assert_eq!(
            log.entries(),
            vec![
                "prepare:second",
                "prepare:first",
                "prepare:source",
                "prepare:sink",
                "finish:source",
                "finish:first",
                "finish:second",
                "finish:sink",
            ]
        );
    }

    #[test]
    fn test_stopping_early_leaves_a_resumable_pipeline() {
        let gathered = CollectingSink::new();
        let mut pipeline = numbers_job(&gathered).build().unwrap();

        let summary = pipeline.run_with(&RunConfig::new().with_max_steps(1)).unwrap();
        assert_eq!(summary.steps, 1);
        assert!(!summary.finished);
        assert!(pipeline.is_prepared());
        assert!(!pipeline.is_finished());
        assert_eq!(gathered.finish_count(), 0);

        pipeline.run().unwrap();
        assert_eq!(gathered.written(), expected_numbers());
    }

    #[test]
    fn test_hook_failure_propagates_from_deep_in_the_chain() {
        let gathered = CollectingSink::new();
        let mut pipeline = PipelineBuilder::new("failing")
            .add(vec_source("small", [1, 2, 3]))
            .add(Transform::from_fn("picky", |inputs: Vec<Option<i64>>| {
                anyhow::ensure!(inputs != [Some(2)], "refusing {inputs:?}");
                Ok(inputs)
            }))
            .add(elementwise("double", |n| n * 2))
            .add(gathered.sink("gather"))
            .build()
            .unwrap();

        let err = pipeline.run().unwrap_err();

        assert_eq!(
            err.to_string(),
            "transform hook failed in stage 'picky': refusing [Some(2)]"
        );
        assert_eq!(gathered.written(), vec![vec![Some(2)]]);
        assert_eq!(gathered.finish_count(), 0);
        assert!(!pipeline.is_finished());
    }

    fn line_source(path: PathBuf) -> Source<String> {
        Source::new(
            Stage::with_prepare("lines", move || Ok(BufReader::new(File::open(&path)?).lines())),
            |lines: &mut Lines<BufReader<File>>| Ok(lines.next().transpose()?),
        )
    }

    fn csv_sink(path: PathBuf) -> Sink<String> {
        Sink::new(
            Stage::with_prepare("file", move || Ok(BufWriter::new(File::create(&path)?)))
                .on_finish(|out: Option<&mut BufWriter<File>>| {
                    if let Some(out) = out {
                        out.flush()?;
                    }
                    Ok(())
                }),
            |out: &mut BufWriter<File>, values: &[Option<String>]| {
                let fields: Vec<&str> = values.iter().map(|v| v.as_deref().unwrap_or("")).collect();
                writeln!(out, "{}", fields.join(","))?;
                Ok(())
            },
        )
    }

    fn shout() -> Transform<String> {
        Transform::from_fn("shout", |inputs: Vec<Option<String>>| {
            Ok(inputs.into_iter().map(|line| line.map(|line| line.to_uppercase())).collect())
        })
    }

    #[test]
    fn test_file_backed_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("input.txt");
        let output_path = dir.path().join("output.txt");
        fs::write(&input_path, "alpha\nbeta\ngamma\n").unwrap();

        let mut pipeline = PipelineBuilder::new("files")
            .add(line_source(input_path))
            .add(shout())
            .add(csv_sink(output_path.clone()))
            .build()
            .unwrap();

        let summary = pipeline.run().unwrap();

        assert_eq!(summary.steps, 3);
        assert_eq!(fs::read_to_string(&output_path).unwrap(), "ALPHA\nBETA\nGAMMA\n");
    }

    #[test]
    fn test_empty_input_never_opens_the_output() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("empty.txt");
        let output_path = dir.path().join("output.txt");
        fs::write(&input_path, "").unwrap();

        let mut pipeline = PipelineBuilder::new("empty_files")
            .add(line_source(input_path))
            .add(shout())
            .add(csv_sink(output_path.clone()))
            .build()
            .unwrap();

        let summary = pipeline.run().unwrap();

        assert_eq!(summary.steps, 0);
        assert!(summary.finished);
        assert!(pipeline.sinks()[0].is_finished());
        assert!(!pipeline.sinks()[0].is_prepared());
        assert!(!output_path.exists());
    }

    #[test]
    fn test_missing_input_file_fails_on_first_step() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let mut pipeline = PipelineBuilder::new("missing")
            .add(line_source(missing))
            .add(Sink::discard("void"))
            .build()
            .unwrap();

        let err = pipeline.advance().unwrap_err();
        assert!(err.to_string().starts_with("prepare hook failed in stage 'lines'"));
        assert!(pipeline.is_prepared());
        assert!(!pipeline.sources()[0].is_prepared());
    }
}
