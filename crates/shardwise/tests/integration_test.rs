//! End-to-end integration test for Shardwise.
//! This test walks through what a caller does: initialise once, then run
//! ops on plain and distributed tensors.

use std::sync::Arc;
use std::thread;

use shardwise::prelude::*;

fn registry() -> Arc<DispatchRegistry> {
    shardwise::init(&ElementwiseConfig::default()).unwrap()
}

/// Test 1: Plain tensors take the library kernel
#[test]
fn test_relu_plain() {
    let registry = registry();
    let x = Tensor::from_vec(vec![-1.0, 0.0, 2.0], &[3]).unwrap();

    let out = shardwise::call(&registry, &OpSymbol::functional("relu"), &x.into(), &Args::new()).unwrap();
    assert!(!out.is_distributed());
    let t = out.into_plain().unwrap().into_tensor().unwrap();
    assert_eq!(t.to_vec(), vec![0.0, 0.0, 2.0]);

    println!("✓ relu on a plain tensor works");
}

/// Test 2: Distributed tensors keep their group and spec
#[test]
fn test_abs_distributed() {
    let registry = registry();
    let pg = ProcessGroup::mock();
    let spec = DistSpec::shard(vec![0], vec![1]).unwrap();
    let x = Tensor::from_vec(vec![-1.0, 2.0, -3.0], &[3]).unwrap();
    let d = DistTensor::from_plain(x, TensorSpec::new(pg.clone(), spec.clone()));

    let out = shardwise::call(&registry, &OpSymbol::method("abs"), &d.clone().into(), &Args::new())
        .unwrap()
        .into_distributed()
        .unwrap();

    assert_eq!(out.payload().to_vec(), vec![1.0, 2.0, 3.0]);
    assert_eq!(out.process_group(), &pg);
    assert_eq!(out.dist_spec(), &spec);
    assert_eq!(d.payload().to_vec(), vec![-1.0, 2.0, -3.0]);

    println!("✓ abs on a distributed tensor works");
}

/// Test 3: Keyword arguments reach the kernel untouched
#[test]
fn test_kwargs_forwarded() {
    let registry = registry();
    let x = Tensor::from_vec(vec![-2.0, -0.5, 0.5, 2.0], &[4]).unwrap();
    let d = DistTensor::from_plain(x.clone(), TensorSpec::replicated(ProcessGroup::mock()));
    let args = Args::new().kwarg("min_val", -1.0).kwarg("max_val", 1.0).kwarg("inplace", true);

    let plain = shardwise::call(&registry, &OpSymbol::functional("hardtanh"), &x.into(), &args)
        .unwrap()
        .into_plain()
        .unwrap()
        .into_tensor()
        .unwrap();
    let dist = shardwise::call(&registry, &OpSymbol::functional("hardtanh"), &d.clone().into(), &args)
        .unwrap()
        .into_distributed()
        .unwrap();

    assert_eq!(plain.to_vec(), vec![-1.0, -0.5, 0.5, 1.0]);
    assert_eq!(dist.payload(), &plain);
    assert_eq!(d.payload().to_vec(), vec![-2.0, -0.5, 0.5, 2.0]);

    println!("✓ kwargs are forwarded");
}

/// Test 4: Non-tensor results cannot be rewrapped
#[test]
fn test_unsupported_output() {
    let registry = registry();
    let x = Tensor::from_vec(vec![1.0, 0.0], &[2]).unwrap();
    let d = DistTensor::from_plain(x.clone(), TensorSpec::replicated(ProcessGroup::mock()));

    let plain = shardwise::call(&registry, &OpSymbol::method("any"), &x.into(), &Args::new()).unwrap();
    assert_eq!(plain.into_plain(), Some(Value::Bool(true)));

    let err = shardwise::call(&registry, &OpSymbol::method("any"), &d.into(), &Args::new()).unwrap_err();
    assert_eq!(
        err,
        Error::UnsupportedOutputType {
            op: "Tensor.any".to_string(),
            found: "bool".to_string(),
        }
    );

    println!("✓ non-tensor results are rejected for distributed inputs");
}

/// Test 5: Kernel errors pass through unchanged
#[test]
fn test_kernel_errors_pass_through() {
    let registry = registry();
    let x = Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
    let d = DistTensor::from_plain(x.clone(), TensorSpec::replicated(ProcessGroup::mock()));
    let symbol = OpSymbol::functional("threshold");

    let plain_err = shardwise::call(&registry, &symbol, &x.into(), &Args::new()).unwrap_err();
    let dist_err = shardwise::call(&registry, &symbol, &d.into(), &Args::new()).unwrap_err();
    assert_eq!(plain_err, dist_err);
    assert!(matches!(dist_err, Error::MissingArgument { .. }));

    println!("✓ kernel errors pass through");
}

/// Test 6: A chain of ops on a sharded tensor gathers to the full result
#[test]
fn test_sharded_chain_across_ranks() {
    let full = Tensor::from_vec(vec![-4.0, -1.0, 0.0, 1.0, 4.0, 9.0], &[6]).unwrap();
    let registry = registry();

    let handles: Vec<_> = MockBackend::create_world(3)
        .into_iter()
        .map(|backend| {
            let full = full.clone();
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let world = World::init(Arc::new(backend));
                let spec = DistSpec::shard(vec![0], vec![3]).unwrap();
                let local = DistTensor::distribute(&full, world.default_group().clone(), spec).unwrap();

                let relu = shardwise::call(&registry, &OpSymbol::functional("relu"), &local.into(), &Args::new())
                    .unwrap()
                    .into_distributed()
                    .unwrap();
                let root = shardwise::call(&registry, &OpSymbol::math("sqrt"), &relu.into(), &Args::new())
                    .unwrap()
                    .into_distributed()
                    .unwrap();
                root.to_replicate().unwrap().into_payload().to_vec()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    println!("✓ sharded chain gathers to the full result");
}

/// Test 7: Config loaded from JSON
#[test]
fn test_config_from_json() {
    let config: ElementwiseConfig = serde_json::from_str(
        r#"{"namespaces": ["method", "functional"], "exclude": ["Tensor.cuda"]}"#,
    )
    .unwrap();
    let dispatch = shardwise::init_with_report(&config).unwrap();

    assert_eq!(dispatch.report().registered.len(), 92 + 30 - 1);
    assert_eq!(dispatch.report().excluded, vec![OpSymbol::method("cuda")]);
    assert!(!dispatch.registry().contains(&OpSymbol::math("abs")));

    println!("✓ config from JSON works");
}
