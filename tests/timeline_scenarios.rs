#[cfg(test)]
mod timeline_scenarios {
    use std::io::Write;
    use tempfile::NamedTempFile;

    use floodchurn::config::SimulationParams;
    use floodchurn::orchestrator::{run_simulation, run_with_provider};
    use floodchurn::report::{render_report, ReportFormat};
    use floodchurn::scheduler::{Action, EventQueue, ScheduledEvent};
    use floodchurn::timeline::{TimelineConfig, TimelineDriver};
    use floodchurn::topology::{parse_annotated, AccessMap, AnnotatedTopologyReader, BuiltinTopology};
    use floodchurn::types::NodeId;

    const LINE_TOPOLOGY: &str = "\
router
# name  comment  y  x
A       NA       0  0
B       NA       0  1
C       NA       0  2
D       NA       0  3

link
# src  dst  bandwidth  metric  delay  queue
A      B    10Mbps     1       5ms    20
B      C    10Mbps     1       5ms    20
C      D    10Mbps     1       5ms    20
";

    fn params(seed: u64) -> SimulationParams {
        SimulationParams {
            num_contents: 10,
            connection_rate: 0.5,
            disconnection_rate: 0.5,
            initialization_period_length: 2.0,
            observation_period_length: 3.0,
            zipf_exponent: 0.8,
            cache_size: 5,
            topology_file: String::new(),
            seed: Some(seed),
            enable_disconnections: false,
            builtin_topology: true,
            prefix: "/prefix".to_string(),
            start_offset: 0.2,
            hop_limit: 2,
        }
    }

    fn generate(params: &SimulationParams, num_routers: usize) -> Vec<ScheduledEvent> {
        let access = AccessMap::attach(num_routers).unwrap();
        let mut driver = TimelineDriver::new(TimelineConfig::from(params), access, params.seed.unwrap()).unwrap();
        let mut queue = EventQueue::new();
        driver.generate(&mut queue).unwrap();
        queue.submitted().to_vec()
    }

    fn flood_times(events: &[ScheduledEvent]) -> Vec<f64> {
        events
            .iter()
            .filter(|e| matches!(e.action, Action::FloodRequest { .. }))
            .map(|e| e.time.as_secs())
            .collect()
    }

    /// Ten contents, rate 0.5, exponent 0.8, 2s + 3s on the grid
    #[test]
    fn test_reference_scenario() {
        for seed in [1, 2, 3, 4, 5] {
            let events = generate(&params(seed), 10);
            let times = flood_times(&events);

            assert!(!times.is_empty());
            assert_eq!(times[0], 0.2);
            for pair in times.windows(2) {
                assert!(pair[0] < pair[1]);
            }
            // Connects never start at or after the stop time.
            assert!(*times.last().unwrap() < 5.0);

            let perturbation = events
                .iter()
                .find(|e| matches!(e.action, Action::FailLink { .. }))
                .unwrap()
                .time
                .as_secs();
            let first_past_init = times.iter().copied().find(|t| *t >= 2.0);
            match first_past_init {
                Some(t) => assert_eq!(perturbation, t),
                // The crossing value lies past the stop time; no connect is drawn there.
                None => assert!(perturbation >= 5.0),
            }

            for event in &events {
                if let Action::FloodRequest { content, .. } = event.action {
                    assert!(content.0 < 10);
                }
            }
        }
    }

    #[test]
    fn test_phase_transition_at_five_seconds() {
        let mut p = params(21);
        p.initialization_period_length = 5.0;
        p.observation_period_length = 50.0;
        p.connection_rate = 1.0;
        let events = generate(&p, 10);

        let boundary: Vec<&ScheduledEvent> = events
            .iter()
            .filter(|e| matches!(e.action, Action::RemoveRoute { face: None, .. } | Action::FailLink { .. }))
            .collect();
        assert_eq!(boundary.len(), 11);

        let at = boundary[0].time;
        assert!(at.as_secs() >= 5.0);
        assert!(boundary.iter().all(|e| e.time == at));

        let routers: Vec<NodeId> = boundary
            .iter()
            .filter_map(|e| match &e.action {
                Action::RemoveRoute { node, prefix, .. } => {
                    assert_eq!(prefix, "/prefix");
                    Some(*node)
                }
                _ => None,
            })
            .collect();
        assert_eq!(routers, (0..10).map(NodeId).collect::<Vec<_>>());
        assert!(matches!(
            boundary[10].action,
            Action::FailLink { a: NodeId(9), b: NodeId(19) }
        ));

        // Every connect before the boundary belongs to the initialization phase.
        let before = flood_times(&events).into_iter().filter(|t| *t < at.as_secs()).count();
        assert!(before >= 1);
        assert!(flood_times(&events).iter().filter(|t| **t < 5.0).count() == before);
    }

    #[test]
    fn test_annotated_topology_end_to_end() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(LINE_TOPOLOGY.as_bytes()).unwrap();

        let mut p = params(8);
        p.builtin_topology = false;
        p.topology_file = file.path().to_str().unwrap().to_string();
        p.observation_period_length = 40.0;
        let report = run_simulation(&p).unwrap();

        assert_eq!(report.num_infrastructure_nodes, 4);
        assert_eq!(report.dispatch.requests_per_client.len(), 3);
        assert_eq!(report.dispatch.links_failed, 1);
        assert!(report.events.iter().any(|e| matches!(
            e.action,
            Action::FailLink { a: NodeId(3), b: NodeId(7) }
        )));

        let json = render_report(&report, ReportFormat::Json).unwrap();
        assert!(json.contains("\"fail_link\""));
    }

    #[test]
    fn test_reader_and_builtin_agree_on_format() {
        let parsed = parse_annotated(LINE_TOPOLOGY).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed.links.len(), 3);

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(LINE_TOPOLOGY.as_bytes()).unwrap();
        let mut p = params(3);
        p.enable_disconnections = true;
        p.connection_rate = 2.0;
        p.observation_period_length = 20.0;

        let from_file = run_with_provider(&p, &AnnotatedTopologyReader::new(file.path())).unwrap();
        let builtin = run_with_provider(&p, &BuiltinTopology::new()).unwrap();
        assert_eq!(from_file.num_infrastructure_nodes, 4);
        assert_eq!(builtin.num_infrastructure_nodes, 10);
        assert!(from_file.timeline.disconnects > 0);
        assert!(builtin.timeline.disconnects > 0);
    }

    #[test]
    fn test_missing_topology_file_fails() {
        let mut p = params(1);
        p.builtin_topology = false;
        p.topology_file = "/definitely/not/here.txt".to_string();
        let err = run_simulation(&p).unwrap_err();
        assert!(format!("{:?}", err).contains("not/here.txt"));
    }
}
