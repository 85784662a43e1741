use orgcrawl::engine::{flatten, FlatKey};
use orgcrawl::models::*;
use orgcrawl::output::{flat_values, write_all, write_snapshot, Snapshot};
use orgcrawl::Error;
use speculate2::speculate;
use tempfile::TempDir;

fn node(id: &str, name: &str, children: Vec<Node>) -> Node {
    let mut node = Node::new(Organization::new(id, name));
    node.children = children;
    node
}

speculate! {
    before {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let tree = node("a", "A", vec![
            node("b", "B", vec![node("d", "D", vec![])]),
            node("c", "C", vec![]),
        ]);
    }

    describe "flatten" {
        it "produces one entry per organization" {
            let index = flatten(&tree, FlatKey::Name);
            assert_eq!(index.keys().collect::<Vec<_>>(), vec!["A", "B", "C", "D"]);
            assert_eq!(index["D"].id, "d");
        }

        it "maps the two-child example to exactly A, B and C" {
            let small = node("a", "A", vec![node("b", "B", vec![]), node("c", "C", vec![])]);
            let index = flatten(&small, FlatKey::Name);
            assert_eq!(index.len(), 3);
            assert_eq!(index["A"].name, "A");
            assert_eq!(index["B"].name, "B");
            assert_eq!(index["C"].name, "C");
        }

        it "keeps enriched environments in the snapshots" {
            let mut env = Environment::new("env-1", "Production");
            env.set_applications(vec![Application { domain: "x.example".to_string(), ..Default::default() }]);
            let mut enriched = node("a", "A", vec![]);
            enriched.organization.environments.push(env);

            let index = flatten(&enriched, FlatKey::Id);
            assert_eq!(index["a"].environments[0].applications()[0].domain, "x.example");
        }
    }

    describe "write_snapshot" {
        it "writes indented JSON and reports the byte count" {
            let path = dir.path().join("metrics.json");
            let bytes = write_snapshot(&tree, &path).expect("write failed");

            let contents = std::fs::read_to_string(&path).expect("read failed");
            assert_eq!(contents.len(), bytes);
            assert!(contents.starts_with("{\n    \"organization\""));
        }

        it "creates missing parent directories" {
            let path = dir.path().join("nested/out/metrics_flat.json");
            let index = flatten(&tree, FlatKey::Name);
            write_snapshot(&flat_values(&index), &path).expect("write failed");

            let written: Vec<Organization> =
                serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(written.len(), 4);
        }

        it "reports a persistence error when the target is not writable" {
            let blocker = dir.path().join("file");
            std::fs::write(&blocker, "x").unwrap();
            let err = write_snapshot(&tree, &blocker.join("metrics.json")).unwrap_err();
            assert!(matches!(err, Error::Persistence { .. }));
        }
    }

    describe "write_all" {
        it "writes every snapshot and reports each byte count" {
            let index = flatten(&tree, FlatKey::Name);
            let snapshots = vec![
                Snapshot::encode(&tree, dir.path().join("metrics.json")).unwrap(),
                Snapshot::encode(&flat_values(&index), dir.path().join("metrics_flat.json")).unwrap(),
            ];

            let written = write_all(&snapshots).expect("write failed");

            assert_eq!(written, vec![snapshots[0].size(), snapshots[1].size()]);
            assert!(snapshots.iter().all(|s| s.path().exists()));
        }

        it "removes earlier files when a later write fails" {
            let blocker = dir.path().join("file");
            std::fs::write(&blocker, "x").unwrap();
            let first = dir.path().join("metrics.json");
            let snapshots = vec![
                Snapshot::encode(&tree, &first).unwrap(),
                Snapshot::encode(&tree, blocker.join("metrics_flat.json")).unwrap(),
            ];

            let err = write_all(&snapshots).unwrap_err();

            assert!(matches!(err, Error::Persistence { .. }));
            assert!(!first.exists());
        }
    }
}
