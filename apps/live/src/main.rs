fn main() {
	runtime::init();
	runtime::run_live();
	println!("quotegate live runtime done");
}
