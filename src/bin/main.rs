use cordyceps_avl::AvlSet;

fn main() {
    let mut set = AvlSet::new();

    for key in [20, 10, 30, 5, 15, 25, 40, 35, 50] {
        set.insert(key);
        println!("insert {key}:");
        print!("{}", set.dump());
    }

    for key in [10, 30, 20] {
        set.remove(&key);
        println!("remove {key}:");
        print!("{}", set.dump());
    }

    if let Err(violation) = set.check_invariants() {
        eprintln!("{violation}");
        std::process::exit(1);
    }

    println!("{set:?}");
}
